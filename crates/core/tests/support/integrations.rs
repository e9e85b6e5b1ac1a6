//! Mocks for the scheduling provider, payment gateway, and notification
//! dispatcher ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mentorbook_core::{
    ChargeOutcome, NotificationDispatcher, PaymentGateway, RefundOutcome, RemoteBooking,
    RemoteBookingRequest, SchedulingProvider,
};
use mentorbook_domain::{Booking, BookingError, CandidateSlot, MentorProfile, Result};

/// Configurable `SchedulingProvider` mock.
pub struct MockSchedulingProvider {
    pub enabled: bool,
    slots: Mutex<Result<Vec<CandidateSlot>>>,
    create_outcome: Mutex<RemoteBooking>,
    cancel_result: Mutex<Result<bool>>,
    reschedule_result: Mutex<Result<bool>>,
    pub reschedule_calls: AtomicUsize,
}

impl Default for MockSchedulingProvider {
    fn default() -> Self {
        Self {
            enabled: true,
            slots: Mutex::new(Ok(Vec::new())),
            create_outcome: Mutex::new(RemoteBooking::failed("not configured")),
            cancel_result: Mutex::new(Ok(true)),
            reschedule_result: Mutex::new(Ok(true)),
            reschedule_calls: AtomicUsize::new(0),
        }
    }
}

impl MockSchedulingProvider {
    /// A provider that is switched off entirely.
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// A provider whose availability call always errors.
    pub fn erroring() -> Self {
        let provider = Self::default();
        *provider.slots.lock().unwrap() =
            Err(BookingError::Integration("connection refused".into()));
        provider
    }

    pub fn with_slots(self, slots: Vec<CandidateSlot>) -> Self {
        *self.slots.lock().unwrap() = Ok(slots);
        self
    }

    pub fn with_create_outcome(self, outcome: RemoteBooking) -> Self {
        *self.create_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_reschedule_result(self, result: Result<bool>) -> Self {
        *self.reschedule_result.lock().unwrap() = result;
        self
    }
}

fn clone_result<T: Clone>(result: &Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value.clone()),
        Err(err) => Err(BookingError::Integration(err.to_string())),
    }
}

#[async_trait]
impl SchedulingProvider for MockSchedulingProvider {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn get_available_slots(
        &self,
        _mentor: &MentorProfile,
        _date: NaiveDate,
    ) -> Result<Vec<CandidateSlot>> {
        clone_result(&self.slots.lock().unwrap())
    }

    async fn create_booking(&self, _request: &RemoteBookingRequest) -> RemoteBooking {
        self.create_outcome.lock().unwrap().clone()
    }

    async fn cancel_booking(&self, _external_id: &str, _reason: Option<&str>) -> Result<bool> {
        clone_result(&self.cancel_result.lock().unwrap())
    }

    async fn reschedule_booking(
        &self,
        _external_id: &str,
        _new_start: DateTime<Utc>,
        _new_end: DateTime<Utc>,
    ) -> Result<bool> {
        self.reschedule_calls.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.reschedule_result.lock().unwrap())
    }
}

/// Configurable `PaymentGateway` mock that records charges and refunds.
#[derive(Clone)]
pub struct MockPaymentGateway {
    decline: bool,
    pub charges: Arc<Mutex<Vec<i64>>>,
    pub refunds: Arc<Mutex<Vec<String>>>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self { decline: false, charges: Arc::default(), refunds: Arc::default() }
    }
}

impl MockPaymentGateway {
    pub fn declining() -> Self {
        Self { decline: true, ..Self::default() }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        amount_cents: i64,
        _currency: &str,
        _payment_method: &str,
    ) -> Result<ChargeOutcome> {
        if self.decline {
            return Ok(ChargeOutcome {
                success: false,
                payment_id: None,
                error: Some("card declined".into()),
            });
        }
        self.charges.lock().unwrap().push(amount_cents);
        Ok(ChargeOutcome {
            success: true,
            payment_id: Some(format!("pay_{}", self.charges.lock().unwrap().len())),
            error: None,
        })
    }

    async fn refund(&self, payment_id: &str, _amount_cents: i64) -> Result<RefundOutcome> {
        self.refunds.lock().unwrap().push(payment_id.to_string());
        Ok(RefundOutcome {
            success: true,
            refund_id: Some(format!("re_{payment_id}")),
            error: None,
        })
    }
}

/// Counting `NotificationDispatcher` mock.
#[derive(Default)]
pub struct MockNotificationDispatcher {
    pub confirmations: AtomicUsize,
    pub cancellations: AtomicUsize,
    pub acceptances: AtomicUsize,
}

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn booking_confirmed(&self, _booking: &Booking) {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
    }

    async fn booking_cancelled(&self, _booking: &Booking) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }

    async fn booking_accepted(&self, _booking: &Booking) {
        self.acceptances.fetch_add(1, Ordering::SeqCst);
    }
}
