//! Admin-side booking operations: lifecycle progression, driver
//! verification at collection, refunds, edit balances and account
//! flags.

use fleethire_core::error::{FleetError, FleetResult};
use fleethire_core::models::booking::Booking;
use fleethire_core::models::driver::{BlacklistReason, CreateDriver, Driver};
use fleethire_core::models::stage::Stage;
use fleethire_core::models::user::User;
use fleethire_core::providers::{
    DocumentStore, FraudProvider, FraudQuery, LicenceProvider, Notifier,
};
use fleethire_core::repository::{
    BookingRepository, CarRepository, DriverRepository, StatusRepository, UserRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::requests::{AccountFlag, RefundDecision, VerifyDriverRequest};
use crate::service::{AMOUNT_EPSILON, BookingService, BookingWithStatus, pounds};

/// Most rows an upcoming-bookings listing returns.
const MAX_UPCOMING: usize = 20;

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
    /// Advance a booking along the happy path, or fail it.
    ///
    /// `failed = true` at collection or return blacklists the
    /// customer and force-cancels the booking.
    pub async fn progress(
        &self,
        admin: &User,
        booking_id: Uuid,
        failed: bool,
    ) -> FleetResult<Booking> {
        Self::ensure_admin(admin)?;

        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        let Some(next) = booking.process.progress_target() else {
            return Err(FleetError::BookingNotReady);
        };
        match booking.process {
            Stage::AwaitingConfirmation => {
                if let Some(open) = self
                    .active_status(booking_id, Stage::AwaitingConfirmation)
                    .await?
                {
                    self.statuses.set_active(open.id, false).await?;
                }
                // Identity checks open alongside the confirmed stage
                // and stay open until the driver is verified.
                self.statuses
                    .insert(booking_id, Stage::AbiCheck, Some(admin.id), true, 0.0, "")
                    .await?;
                self.statuses
                    .insert(booking_id, Stage::DvlaCheck, Some(admin.id), true, 0.0, "")
                    .await?;
                self.statuses
                    .insert(booking_id, next, Some(admin.id), true, 0.0, "")
                    .await?;
                self.bookings.set_process(booking_id, next).await?;
            }
            Stage::BookingConfirmed => {
                // Open identity checks block progression outright,
                // even a failed one; the admin cancels instead.
                let abi_open = self.active_status(booking_id, Stage::AbiCheck).await?;
                let dvla_open = self.active_status(booking_id, Stage::DvlaCheck).await?;
                if abi_open.is_some() || dvla_open.is_some() {
                    return Err(FleetError::BookingNotReady);
                }
                if failed {
                    self.fail_booking(admin, &booking, "user failed to collect booking - User will be blackListed")
                        .await?;
                } else {
                    if let Some(open) = self
                        .active_status(booking_id, Stage::BookingConfirmed)
                        .await?
                    {
                        self.statuses.set_active(open.id, false).await?;
                    }
                    self.statuses
                        .insert(booking_id, next, Some(admin.id), true, 0.0, "")
                        .await?;
                    self.bookings.set_process(booking_id, next).await?;
                }
            }
            Stage::Collected if failed => {
                self.fail_booking(admin, &booking, "user failed to return booking - User will be blackListed")
                    .await?;
            }
            Stage::Collected => {
                if let Some(open) = self.active_status(booking_id, Stage::Collected).await? {
                    self.statuses.set_active(open.id, false).await?;
                }
                self.statuses
                    .insert(booking_id, next, Some(admin.id), true, 0.0, "")
                    .await?;
                self.bookings.set_process(booking_id, next).await?;
            }
            Stage::Returned => {
                self.statuses.deactivate_all(booking_id).await?;
                self.statuses
                    .insert(booking_id, next, Some(admin.id), false, 0.0, "")
                    .await?;
                self.bookings.set_process(booking_id, next).await?;
                // A completed rental qualifies for late returns next
                // time.
                self.users.set_repeat(booking.user_id).await?;
            }
            _ => return Err(FleetError::BookingNotReady),
        }

        info!(booking_id = %booking_id, admin_id = %admin.id, failed, "Booking progressed");

        self.bookings.get(booking_id).await
    }

    async fn fail_booking(
        &self,
        admin: &User,
        booking: &Booking,
        message: &str,
    ) -> FleetResult<()> {
        self.users.set_blacklisted(booking.user_id, true).await?;
        self.statuses.deactivate_all(booking.id).await?;
        self.statuses
            .insert(
                booking.id,
                Stage::Cancelled,
                Some(admin.id),
                false,
                0.0,
                message,
            )
            .await?;
        self.bookings
            .set_process(booking.id, Stage::Cancelled)
            .await?;
        warn!(
            booking_id = %booking.id,
            user_id = %booking.user_id,
            message,
            "Booking failed, customer blacklisted"
        );
        Ok(())
    }

    /// Verify the named driver at collection.
    ///
    /// On a clean result the documents are stored, the identity
    /// checks close, and the booking moves to `Collected` with the
    /// driver attached. A provider hit blacklists the driver; at most
    /// one driver record ever exists per name, so repeating the call
    /// fails the same way without creating another record.
    pub async fn verify_driver(
        &self,
        admin: &User,
        booking_id: Uuid,
        req: VerifyDriverRequest,
    ) -> FleetResult<Booking> {
        Self::ensure_admin(admin)?;

        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        if booking.process != Stage::BookingConfirmed {
            return Err(FleetError::BookingNotReady);
        }
        let abi = self
            .active_status(booking_id, Stage::AbiCheck)
            .await?
            .ok_or(FleetError::BookingNotReady)?;
        let dvla = self
            .active_status(booking_id, Stage::DvlaCheck)
            .await?
            .ok_or(FleetError::BookingNotReady)?;

        let existing = self
            .drivers
            .get_by_name(&req.last_name, &req.other_names)
            .await?;

        if let Some(driver) = &existing {
            if driver.blacklisted {
                return Err(match driver.blacklist_reason {
                    Some(BlacklistReason::InvalidLicence) => FleetError::InvalidLicence,
                    _ => FleetError::DriverBlacklisted,
                });
            }
        }

        if self.licence.is_invalid_licence(&req.licence_number).await? {
            let driver = self
                .blacklist_driver(existing, &req, BlacklistReason::InvalidLicence)
                .await?;
            let notifier = self.notifier.clone();
            tokio::spawn(async move {
                if let Err(error) = notifier.notify_invalid_licence(&driver).await {
                    warn!(%error, driver_id = %driver.id, "Invalid-licence notification failed");
                }
            });
            return Err(FleetError::InvalidLicence);
        }

        let query = FraudQuery {
            last_name: req.last_name.clone(),
            other_names: req.other_names.clone(),
            address: req.address.clone(),
            postcode: req.postcode.clone(),
            dob: req.dob,
        };
        if self.fraud.has_fraudulent_claim(&query).await? {
            self.blacklist_driver(existing, &req, BlacklistReason::FraudulentClaim)
                .await?;
            return Err(FleetError::FraudulentClaim);
        }

        let driver = match existing {
            Some(driver) => driver,
            None => self.create_driver(&req, None).await?,
        };

        for document in &req.documents {
            self.documents
                .save_image(driver.id, booking_id, document.kind, document.bytes.clone())
                .await?;
        }

        if let Some(open) = self
            .active_status(booking_id, Stage::BookingConfirmed)
            .await?
        {
            self.statuses.set_active(open.id, false).await?;
        }
        self.statuses.set_active(abi.id, false).await?;
        self.statuses.set_active(dvla.id, false).await?;
        self.statuses
            .insert(booking_id, Stage::Collected, Some(admin.id), true, 0.0, "")
            .await?;
        self.bookings.set_driver(booking_id, driver.id).await?;
        self.bookings
            .set_process(booking_id, Stage::Collected)
            .await?;

        info!(
            booking_id = %booking_id,
            driver_id = %driver.id,
            "Driver verified, booking collected"
        );

        self.bookings.get(booking_id).await
    }

    async fn create_driver(
        &self,
        req: &VerifyDriverRequest,
        blacklist_reason: Option<BlacklistReason>,
    ) -> FleetResult<Driver> {
        self.drivers
            .create(CreateDriver {
                last_name: req.last_name.clone(),
                other_names: req.other_names.clone(),
                licence_number: req.licence_number.clone(),
                address: req.address.clone(),
                postcode: req.postcode.clone(),
                dob: req.dob,
                blacklisted: blacklist_reason.is_some(),
                blacklist_reason,
            })
            .await
    }

    async fn blacklist_driver(
        &self,
        existing: Option<Driver>,
        req: &VerifyDriverRequest,
        reason: BlacklistReason,
    ) -> FleetResult<Driver> {
        match existing {
            Some(driver) => {
                self.drivers.blacklist(driver.id, reason).await?;
                self.drivers.get(driver.id).await
            }
            None => self.create_driver(req, Some(reason)).await,
        }
    }

    /// Settle a queried refund on a cancelled booking.
    pub async fn process_refund(
        &self,
        admin: &User,
        booking_id: Uuid,
        decision: RefundDecision,
    ) -> FleetResult<Booking> {
        Self::ensure_admin(admin)?;

        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        if booking.process != Stage::Cancelled {
            return Err(FleetError::BookingNotReady);
        }
        let query = self
            .active_status(booking_id, Stage::QueryingRefund)
            .await?
            .ok_or(FleetError::BookingNotReady)?;

        self.statuses.set_active(query.id, false).await?;
        if decision.accept {
            let amount = booking.amount_paid;
            self.bookings.set_amount_paid(booking_id, 0.0).await?;
            let description = match &decision.reason {
                Some(reason) => format!("Refund of {} Given - {reason}", pounds(amount)),
                None => format!("Refund of {} Given", pounds(amount)),
            };
            self.statuses
                .insert(
                    booking_id,
                    Stage::RefundIssued,
                    Some(admin.id),
                    false,
                    amount,
                    &description,
                )
                .await?;
        } else {
            let description = match &decision.reason {
                Some(reason) => format!("Refund Rejected - {reason}"),
                None => "Refund Rejected".to_string(),
            };
            self.statuses
                .insert(
                    booking_id,
                    Stage::RefundRejected,
                    Some(admin.id),
                    false,
                    booking.amount_paid,
                    &description,
                )
                .await?;
        }

        info!(
            booking_id = %booking_id,
            accepted = decision.accept,
            "Refund processed"
        );

        self.bookings.get(booking_id).await
    }

    /// Settle the balance an edit left open, at collection or return.
    pub async fn process_extra_payment(
        &self,
        admin: &User,
        booking_id: Uuid,
    ) -> FleetResult<Booking> {
        Self::ensure_admin(admin)?;

        let lock = self.locks.handle(booking_id);
        let _guard = lock.lock().await;

        let booking = self.bookings.get(booking_id).await?;
        if booking.process == Stage::Cancelled {
            return Err(FleetError::AlreadyCancelled);
        }
        if !booking.process.at_or_past(Stage::BookingConfirmed) {
            return Err(FleetError::BookingNotReady);
        }
        let open = self
            .active_status(booking_id, Stage::EditAwaitingPayment)
            .await?
            .ok_or(FleetError::NoPaymentNeeded)?;

        let balance = booking.total_cost - booking.amount_paid;
        let moment = if booking.process.at_or_past(Stage::Collected) {
            "Return"
        } else {
            "Collection"
        };
        let description = if booking.is_refund() {
            format!("User Refunded {} on {moment}", pounds(-balance))
        } else {
            format!("User Payed {} on {moment}", pounds(balance))
        };

        self.bookings
            .set_amount_paid(booking_id, booking.total_cost)
            .await?;
        self.statuses.set_active(open.id, false).await?;
        self.statuses
            .insert(
                booking_id,
                Stage::EditPaymentAccepted,
                Some(admin.id),
                false,
                balance,
                &description,
            )
            .await?;

        info!(booking_id = %booking_id, balance, "Edit balance settled");

        self.bookings.get(booking_id).await
    }

    /// Cancelled bookings still holding customer money.
    pub async fn refund_queue(&self, admin: &User) -> FleetResult<Vec<BookingWithStatus>> {
        Self::ensure_admin(admin)?;

        let cancelled = self.bookings.list_by_stage(Stage::Cancelled, 1000).await?;
        let mut queue = Vec::new();
        for booking in cancelled {
            if booking.amount_paid <= AMOUNT_EPSILON {
                continue;
            }
            let active_statuses = self.statuses.active_statuses(booking.id).await?;
            if active_statuses
                .iter()
                .any(|s| s.stage == Stage::QueryingRefund)
            {
                queue.push(BookingWithStatus {
                    booking,
                    active_statuses,
                });
            }
        }
        Ok(queue)
    }

    /// Bookings currently sitting at a stage, capped at twenty rows.
    pub async fn upcoming_bookings(
        &self,
        admin: &User,
        stage: Stage,
        limit: usize,
    ) -> FleetResult<Vec<Booking>> {
        Self::ensure_admin(admin)?;
        self.bookings
            .list_by_stage(stage, limit.min(MAX_UPCOMING))
            .await
    }

    /// Bookings belonging to customers matching a name/email search.
    pub async fn search_bookings(&self, admin: &User, term: &str) -> FleetResult<Vec<Booking>> {
        Self::ensure_admin(admin)?;

        let mut results = Vec::new();
        for user in self.users.search(term).await? {
            results.extend(self.bookings.list_for_user(user.id).await?);
        }
        Ok(results)
    }

    /// Set an account flag. Admins cannot demote themselves.
    pub async fn set_user_flag(
        &self,
        admin: &User,
        user_id: Uuid,
        flag: AccountFlag,
    ) -> FleetResult<()> {
        Self::ensure_admin(admin)?;

        if admin.id == user_id && flag == AccountFlag::Admin(false) {
            return Err(FleetError::InvalidInput {
                message: "cannot revoke own admin access".into(),
            });
        }

        match flag {
            AccountFlag::Disabled(value) => self.users.set_disabled(user_id, value).await,
            AccountFlag::Blacklisted(value) => self.users.set_blacklisted(user_id, value).await,
            AccountFlag::Admin(value) => self.users.set_admin(user_id, value).await,
        }
    }
}
