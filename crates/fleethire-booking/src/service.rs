//! Customer-facing booking operations.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{Days, Utc};
use fleethire_core::error::{FleetError, FleetResult};
use fleethire_core::models::accessory::Accessory;
use fleethire_core::models::booking::{Booking, CreateBooking, UpdateBookingTerms};
use fleethire_core::models::car::Car;
use fleethire_core::models::stage::Stage;
use fleethire_core::models::status::BookingStatus;
use fleethire_core::models::user::User;
use fleethire_core::pricing;
use fleethire_core::providers::{DocumentStore, FraudProvider, LicenceProvider, Notifier};
use fleethire_core::repository::{
    BookingRepository, CarRepository, DriverRepository, StatusRepository, UserRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::locks::LockRegistry;
use crate::requests::{CreateBookingRequest, EditBookingRequest, ExtendBookingRequest};

/// Minimum age for cars flagged over-25.
const OVER_25_AGE: i32 = 25;
/// Most accessories an edit may add or remove in one call.
const MAX_ACCESSORY_CHANGES: usize = 10;
/// Tolerance for monetary/day-count comparisons.
pub(crate) const AMOUNT_EPSILON: f64 = 1e-6;

pub(crate) fn pounds(amount: f64) -> String {
    format!("£{amount:.2}")
}

/// A booking together with its car and accessory details.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub booking: Booking,
    pub car: Car,
    pub accessories: Vec<Accessory>,
}

/// A booking with its currently-open status rows.
#[derive(Debug, Clone)]
pub struct BookingWithStatus {
    pub booking: Booking,
    pub active_statuses: Vec<BookingStatus>,
}

/// A user's bookings grouped by their current lifecycle stage.
#[derive(Debug, Clone)]
pub struct StageGroup {
    pub stage: Stage,
    pub bookings: Vec<BookingWithStatus>,
}

/// The booking state machine.
///
/// Generic over the repository and provider traits so the service
/// layer never depends on the storage or provider crates. All
/// transitions re-read the booking after taking its lock.
pub struct BookingService<U, C, B, S, D, L, F, N, P> {
    pub(crate) users: U,
    pub(crate) cars: C,
    pub(crate) bookings: B,
    pub(crate) statuses: S,
    pub(crate) drivers: D,
    pub(crate) licence: L,
    pub(crate) fraud: F,
    pub(crate) notifier: Arc<N>,
    pub(crate) documents: P,
    pub(crate) locks: LockRegistry,
}

impl<U, C, B, S, D, L, F, N, P> BookingService<U, C, B, S, D, L, F, N, P>
where
    U: UserRepository,
    C: CarRepository,
    B: BookingRepository,
    S: StatusRepository,
    D: DriverRepository,
    L: LicenceProvider,
    F: FraudProvider,
    N: Notifier + 'static,
    P: DocumentStore,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: U,
        cars: C,
        bookings: B,
        statuses: S,
        drivers: D,
        licence: L,
        fraud: F,
        notifier: Arc<N>,
        documents: P,
    ) -> Self {
        Self {
            users,
            cars,
            bookings,
            statuses,
            drivers,
            licence,
            fraud,
            notifier,
            documents,
            locks: LockRegistry::new(),
        }
    }

    pub(crate) fn ensure_admin(caller: &User) -> FleetResult<()> {
        if caller.admin {
            Ok(())
        } else {
            Err(FleetError::NotAdmin)
        }
    }

    pub(crate) fn ensure_owner_or_admin(caller: &User, booking: &Booking) -> FleetResult<()> {
        if caller.admin || booking.user_id == caller.id {
            Ok(())
        } else {
            Err(FleetError::NotOwner)
        }
    }

    /// The status row currently awaiting action for (booking, stage),
    /// if any.
    pub(crate) async fn active_status(
        &self,
        booking_id: Uuid,
        stage: Stage,
    ) -> FleetResult<Option<BookingStatus>> {
        Ok(self
            .bookings_latest(booking_id, stage)
            .await?
            .filter(|s| s.active))
    }

    async fn bookings_latest(
        &self,
        booking_id: Uuid,
        stage: Stage,
    ) -> FleetResult<Option<BookingStatus>> {
        self.statuses.latest(booking_id, stage).await
    }

    fn validate_accessory_ids(ids: &[Uuid], catalogue: &[Accessory]) -> FleetResult<()> {
        if ids.len() > MAX_ACCESSORY_CHANGES {
            return Err(FleetError::InvalidInput {
                message: format!("at most {MAX_ACCESSORY_CHANGES} accessories per request"),
            });
        }
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(FleetError::InvalidInput {
                    message: "duplicate accessory".into(),
                });
            }
            if !catalogue.iter().any(|a| a.id == *id) {
                return Err(FleetError::InvalidInput {
                    message: format!("unknown accessory {id}"),
                });
            }
        }
        Ok(())
    }

    /// Create a booking for the caller and open the payment stage.
    pub async fn create(
        &self,
        caller: &User,
        req: CreateBookingRequest,
    ) -> FleetResult<BookingDetails> {
        if caller.blacklisted {
            return Err(FleetError::UserBlacklisted);
        }
        if req.late_return && !caller.repeat {
            return Err(FleetError::LateReturnNotAllowed);
        }

        let length = pricing::rental_length(req.start, req.end, req.late_return, req.full_day)?;
        if (length.days - req.expected_days).abs() > AMOUNT_EPSILON {
            return Err(FleetError::InvalidInput {
                message: format!(
                    "quoted length {} does not match computed {}",
                    req.expected_days, length.days
                ),
            });
        }

        let car = self.cars.get(req.car_id).await?;
        if car.disabled {
            return Err(FleetError::CarUnavailable);
        }
        if car.over_25 && caller.age_years(Utc::now().date_naive()) < OVER_25_AGE {
            return Err(FleetError::AgeRequirement);
        }

        if self
            .bookings
            .has_overlap(car.id, req.start, req.end, None)
            .await?
        {
            return Err(FleetError::Overlap);
        }
        // A late/full-day return occupies the car into the grace day.
        if length.finish > req.end
            && self
                .bookings
                .has_overlap(car.id, length.finish, length.finish, None)
                .await?
        {
            return Err(FleetError::Overlap);
        }

        let catalogue = self.bookings.list_accessories().await?;
        Self::validate_accessory_ids(&req.accessory_ids, &catalogue)?;

        let total_cost = pricing::cost(car.daily_rate, length.days);

        let booking = self
            .bookings
            .create(CreateBooking {
                car_id: car.id,
                user_id: caller.id,
                start: req.start,
                end: req.end,
                finish: length.finish,
                total_cost,
                late_return: length.late_return,
                full_day: length.full_day,
                booking_length: length.days,
            })
            .await?;

        if !req.accessory_ids.is_empty() {
            self.bookings
                .add_accessories(booking.id, &req.accessory_ids)
                .await?;
        }

        self.statuses
            .insert(
                booking.id,
                Stage::AwaitingPayment,
                None,
                true,
                total_cost,
                &format!("Need to pay {}", pounds(total_cost)),
            )
            .await?;

        info!(
            booking_id = %booking.id,
            car_id = %car.id,
            user_id = %caller.id,
            days = length.days,
            total_cost,
            "Booking created"
        );

        let accessories = self.bookings.accessories(booking.id).await?;
        Ok(BookingDetails {
            booking,
            car,
            accessories,
        })
    }

    /// Pay the outstanding balance on a fresh booking.
    pub async fn make_payment(&self, caller: &User, booking_id: Uuid) -> FleetResult<Booking> {
        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        Self::ensure_owner_or_admin(caller, &booking)?;

        let awaiting = self
            .active_status(booking_id, Stage::AwaitingPayment)
            .await?
            .ok_or(FleetError::BookingNotReady)?;

        let due = booking.amount_due();
        if due <= AMOUNT_EPSILON {
            return Err(FleetError::NoPaymentNeeded);
        }

        self.bookings
            .set_amount_paid(booking_id, booking.total_cost)
            .await?;
        self.statuses
            .insert(
                booking_id,
                Stage::PaymentAccepted,
                None,
                false,
                due,
                &format!("Made payment of {}", pounds(due)),
            )
            .await?;
        self.statuses.set_active(awaiting.id, false).await?;
        self.statuses
            .insert(booking_id, Stage::AwaitingConfirmation, None, true, 0.0, "")
            .await?;
        self.bookings
            .set_process(booking_id, Stage::AwaitingConfirmation)
            .await?;

        info!(booking_id = %booking_id, amount = due, "Payment recorded");

        self.bookings.get(booking_id).await
    }

    /// Pay the outstanding balance on a granted extension.
    pub async fn make_extension_payment(
        &self,
        caller: &User,
        booking_id: Uuid,
    ) -> FleetResult<Booking> {
        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        Self::ensure_owner_or_admin(caller, &booking)?;

        let awaiting = self
            .active_status(booking_id, Stage::ExtensionAwaitingPayment)
            .await?
            .ok_or(FleetError::BookingNotReady)?;

        let due = booking.amount_due();
        if due <= AMOUNT_EPSILON {
            return Err(FleetError::NoPaymentNeeded);
        }

        self.bookings
            .set_amount_paid(booking_id, booking.total_cost)
            .await?;
        self.statuses
            .insert(
                booking_id,
                Stage::ExtensionPaymentAccepted,
                None,
                false,
                due,
                &format!("Made payment of {}", pounds(due)),
            )
            .await?;
        self.statuses.set_active(awaiting.id, false).await?;

        info!(booking_id = %booking_id, amount = due, "Extension payment recorded");

        self.bookings.get(booking_id).await
    }

    /// Extend a collected booking, opening a payment stage for the
    /// difference.
    pub async fn extend(
        &self,
        caller: &User,
        booking_id: Uuid,
        req: ExtendBookingRequest,
    ) -> FleetResult<Booking> {
        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        Self::ensure_owner_or_admin(caller, &booking)?;

        if booking.process != Stage::Collected {
            return Err(FleetError::BookingNotReady);
        }
        if self
            .active_status(booking_id, Stage::ExtensionAwaitingPayment)
            .await?
            .is_some()
        {
            // The previous extension has not been paid for yet.
            return Err(FleetError::BookingNotReady);
        }
        if req.days < 1 || req.days > pricing::MAX_EXTENSION_DAYS {
            return Err(FleetError::OutOfBounds);
        }

        let allowed = self
            .bookings
            .count_extension_days(booking.car_id, booking.end, booking.id)
            .await?;
        if req.days > allowed {
            return Err(FleetError::ExtensionNotAllowed);
        }

        let mut late_return = req.late_return;
        let mut full_day = req.full_day && !late_return;
        let new_end = booking.end + Days::new(req.days as u64);

        // An increment needs the day after the new end free. When the
        // next rental starts right there, drop the increment instead
        // of refusing the extension.
        if late_return || full_day {
            let grace = new_end + Days::new(1);
            let collides = if req.days == allowed && allowed < pricing::MAX_EXTENSION_DAYS {
                true
            } else {
                self.bookings
                    .has_overlap(booking.car_id, grace, grace, Some(booking.id))
                    .await?
            };
            if collides {
                late_return = false;
                full_day = false;
            }
        }
        if late_return {
            let owner = self.users.get_by_id(booking.user_id).await?;
            if !owner.repeat {
                return Err(FleetError::LateReturnNotAllowed);
            }
        }

        let rate = booking.daily_rate();
        let base_days =
            pricing::strip_increment(booking.booking_length, booking.late_return, booking.full_day);
        let new_days = pricing::apply_increment(base_days + req.days as f64, late_return, full_day);
        let new_cost = pricing::cost(rate, new_days);
        let finish = if late_return || full_day {
            new_end + Days::new(1)
        } else {
            new_end
        };

        let due = new_cost - booking.amount_paid;
        self.statuses
            .insert(
                booking_id,
                Stage::ExtensionAwaitingPayment,
                None,
                true,
                due,
                &format!("Need to pay {}", pounds(due)),
            )
            .await?;
        let mut description = format!(
            "{} -> {} | Days {:.1} -> {:.1} | ",
            pounds(booking.total_cost),
            pounds(new_cost),
            booking.booking_length,
            new_days,
        );
        if late_return != booking.late_return {
            description.push_str(&format!("LateReturn: {late_return}"));
        } else if full_day != booking.full_day {
            description.push_str(&format!("Full Day: {full_day}"));
        }
        self.statuses
            .insert(
                booking_id,
                Stage::Extended,
                None,
                false,
                new_days,
                &description,
            )
            .await?;
        self.bookings
            .update_terms(
                booking_id,
                UpdateBookingTerms {
                    total_cost: new_cost,
                    booking_length: new_days,
                    late_return,
                    full_day,
                    end: new_end,
                    finish,
                },
            )
            .await?;

        info!(
            booking_id = %booking_id,
            days = req.days,
            new_cost,
            "Booking extended"
        );

        self.bookings.get(booking_id).await
    }

    /// Edit return flags and accessories before collection.
    pub async fn edit(
        &self,
        caller: &User,
        booking_id: Uuid,
        req: EditBookingRequest,
    ) -> FleetResult<Booking> {
        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        Self::ensure_owner_or_admin(caller, &booking)?;

        if !matches!(
            booking.process,
            Stage::AwaitingPayment | Stage::AwaitingConfirmation | Stage::BookingConfirmed
        ) {
            return Err(FleetError::BookingNotReady);
        }

        let late_return = req.late_return;
        let full_day = req.full_day && !late_return;
        if late_return && !booking.late_return {
            let owner = self.users.get_by_id(booking.user_id).await?;
            if !owner.repeat {
                return Err(FleetError::LateReturnNotAllowed);
            }
        }

        let flags_changed = late_return != booking.late_return || full_day != booking.full_day;
        let accessories_changed = !req.add_accessories.is_empty() || !req.remove_accessories.is_empty();
        if !flags_changed && !accessories_changed {
            return Err(FleetError::InvalidInput {
                message: "no changes requested".into(),
            });
        }

        let had_increment = booking.late_return || booking.full_day;
        let wants_increment = late_return || full_day;
        if wants_increment && !had_increment {
            let grace = booking.end + Days::new(1);
            if self
                .bookings
                .has_overlap(booking.car_id, grace, grace, Some(booking.id))
                .await?
            {
                return Err(FleetError::Overlap);
            }
        }

        let mut description = Vec::new();

        let new_cost = if flags_changed {
            let rate = booking.daily_rate();
            let base = pricing::strip_increment(
                booking.booking_length,
                booking.late_return,
                booking.full_day,
            );
            let new_days = pricing::apply_increment(base, late_return, full_day);
            let new_cost = pricing::cost(rate, new_days);
            let finish = if late_return || full_day {
                booking.end + Days::new(1)
            } else {
                booking.end
            };
            self.bookings
                .update_terms(
                    booking_id,
                    UpdateBookingTerms {
                        total_cost: new_cost,
                        booking_length: new_days,
                        late_return,
                        full_day,
                        end: booking.end,
                        finish,
                    },
                )
                .await?;
            description.push(format!(
                "Days {} -> {} | {} -> {}",
                booking.booking_length,
                new_days,
                pounds(booking.total_cost),
                pounds(new_cost),
            ));
            new_cost
        } else {
            booking.total_cost
        };

        if accessories_changed {
            let mut combined = req.add_accessories.clone();
            combined.extend(&req.remove_accessories);
            let mut seen = HashSet::new();
            if !combined.iter().all(|id| seen.insert(*id)) {
                return Err(FleetError::InvalidInput {
                    message: "accessory listed in both add and remove".into(),
                });
            }
            let catalogue = self.bookings.list_accessories().await?;
            Self::validate_accessory_ids(&req.add_accessories, &catalogue)?;
            if req.remove_accessories.len() > MAX_ACCESSORY_CHANGES {
                return Err(FleetError::InvalidInput {
                    message: format!("at most {MAX_ACCESSORY_CHANGES} accessories per request"),
                });
            }

            if !req.add_accessories.is_empty() {
                self.bookings
                    .add_accessories(booking_id, &req.add_accessories)
                    .await?;
                let names: Vec<_> = catalogue
                    .iter()
                    .filter(|a| req.add_accessories.contains(&a.id))
                    .map(|a| a.description.as_str())
                    .collect();
                description.push(format!("ADD: {}", names.join(", ")));
            }
            if !req.remove_accessories.is_empty() {
                self.bookings
                    .remove_accessories(booking_id, &req.remove_accessories)
                    .await?;
                let names: Vec<_> = catalogue
                    .iter()
                    .filter(|a| req.remove_accessories.contains(&a.id))
                    .map(|a| a.description.as_str())
                    .collect();
                description.push(format!("REMOVE: {}", names.join(", ")));
            }
        }

        self.statuses
            .insert(
                booking_id,
                Stage::BookingEdited,
                None,
                false,
                0.0,
                &description.join(" | "),
            )
            .await?;

        // Once payment has been taken, a changed total leaves a
        // balance to settle at the desk.
        let balance = new_cost - booking.amount_paid;
        if booking.process != Stage::AwaitingPayment && balance.abs() > AMOUNT_EPSILON {
            if let Some(open) = self
                .active_status(booking_id, Stage::EditAwaitingPayment)
                .await?
            {
                self.statuses.set_active(open.id, false).await?;
            }
            let message = if balance > 0.0 {
                format!("Need to pay {} on Collection", pounds(balance))
            } else {
                format!("Refund of {} on Collection", pounds(-balance))
            };
            self.statuses
                .insert(
                    booking_id,
                    Stage::EditAwaitingPayment,
                    None,
                    true,
                    balance,
                    &message,
                )
                .await?;
        }

        info!(booking_id = %booking_id, "Booking edited");

        self.bookings.get(booking_id).await
    }

    /// Cancel a booking. Customers may cancel up to confirmation;
    /// admins at any non-terminal stage.
    pub async fn cancel(&self, caller: &User, booking_id: Uuid) -> FleetResult<Booking> {
        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        if booking.process == Stage::Cancelled {
            return Err(FleetError::AlreadyCancelled);
        }
        if !booking.process.can_transition(Stage::Cancelled) {
            return Err(FleetError::BookingNotReady);
        }
        if !caller.admin {
            if booking.user_id != caller.id {
                return Err(FleetError::NotOwner);
            }
            if !matches!(
                booking.process,
                Stage::AwaitingPayment | Stage::AwaitingConfirmation | Stage::BookingConfirmed
            ) {
                // Past collection only staff can cancel.
                return Err(FleetError::NotAdmin);
            }
        }

        self.statuses.deactivate_all(booking_id).await?;
        if booking.amount_paid > AMOUNT_EPSILON {
            self.statuses
                .insert(
                    booking_id,
                    Stage::QueryingRefund,
                    None,
                    true,
                    booking.amount_paid,
                    &format!("Refund of {} requested", pounds(booking.amount_paid)),
                )
                .await?;
        }
        self.statuses
            .insert(booking_id, Stage::Cancelled, None, false, 0.0, "")
            .await?;
        self.bookings
            .set_process(booking_id, Stage::Cancelled)
            .await?;

        info!(booking_id = %booking_id, by = %caller.id, "Booking cancelled");

        self.bookings.get(booking_id).await
    }

    /// The full status history of a booking.
    pub async fn history(&self, caller: &User, booking_id: Uuid) -> FleetResult<Vec<BookingStatus>> {
        let booking = self.bookings.get(booking_id).await?;
        Self::ensure_owner_or_admin(caller, &booking)?;
        self.statuses.history(booking_id).await
    }

    /// Days the booking could currently be extended by.
    pub async fn extension_window(&self, caller: &User, booking_id: Uuid) -> FleetResult<i64> {
        let booking = self.bookings.get(booking_id).await?;
        Self::ensure_owner_or_admin(caller, &booking)?;
        self.bookings
            .count_extension_days(booking.car_id, booking.end, booking.id)
            .await
    }

    /// The caller's bookings, grouped by current stage, each with its
    /// open status rows.
    pub async fn bookings_for_user(&self, caller: &User) -> FleetResult<Vec<StageGroup>> {
        let bookings = self.bookings.list_for_user(caller.id).await?;

        let mut groups: BTreeMap<i64, StageGroup> = BTreeMap::new();
        for booking in bookings {
            let active_statuses = self.statuses.active_statuses(booking.id).await?;
            let stage = booking.process;
            groups
                .entry(stage.code())
                .or_insert_with(|| StageGroup {
                    stage,
                    bookings: Vec::new(),
                })
                .bookings
                .push(BookingWithStatus {
                    booking,
                    active_statuses,
                });
        }

        Ok(groups.into_values().collect())
    }
}
