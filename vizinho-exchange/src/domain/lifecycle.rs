//! Centralized transition validation for the request/offer lifecycle.
//!
//! Every handler (HTTP, event subscriber, admin tooling) funnels through
//! these functions instead of re-checking status strings inline. The
//! functions are pure: they take entity snapshots and either approve the
//! transition or explain why it is illegal. Applying the approved writes
//! (and doing so atomically) is the caller's job.

use uuid::Uuid;

use vizinho_shared::errors::{AppError, ErrorCode};
use vizinho_shared::types::auth::UserRole;

use super::status::{OfferStatus, RequestStatus, ReviewType};

/// The slice of a request the state machine cares about.
#[derive(Debug, Clone, Copy)]
pub struct RequestSnapshot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: RequestStatus,
}

/// The slice of an offer the state machine cares about.
#[derive(Debug, Clone, Copy)]
pub struct OfferSnapshot {
    pub id: Uuid,
    pub request_id: Uuid,
    pub helper_id: Uuid,
    pub status: OfferStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("operation not permitted in current state: {0}")]
    InvalidState(&'static str),
    #[error("caller is not allowed to perform this operation")]
    Unauthorized,
    #[error("you cannot offer help on your own request")]
    CannotOfferOwnRequest,
    #[error("helper already has an active offer on this request")]
    DuplicateOffer,
    #[error("this side of the exchange has already been reviewed")]
    DuplicateReview,
    #[error("the exchange is not completed yet")]
    NotEligible,
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let code = match err {
            LifecycleError::InvalidState(_) => ErrorCode::InvalidState,
            LifecycleError::Unauthorized => ErrorCode::Forbidden,
            LifecycleError::CannotOfferOwnRequest => ErrorCode::CannotOfferOwnRequest,
            LifecycleError::DuplicateOffer => ErrorCode::DuplicateOffer,
            LifecycleError::DuplicateReview => ErrorCode::DuplicateReview,
            LifecycleError::NotEligible => ErrorCode::NotEligible,
            LifecycleError::RatingOutOfRange => ErrorCode::ValidationError,
        };
        AppError::new(code, err.to_string())
    }
}

/// A helper pledges against an open request.
///
/// `existing_offers` are the helper's own offers on this request; one active
/// offer per helper per request.
pub fn submit_offer(
    request: &RequestSnapshot,
    helper_id: Uuid,
    existing_offers: &[OfferSnapshot],
) -> Result<(), LifecycleError> {
    if request.status != RequestStatus::Open {
        return Err(LifecycleError::InvalidState("request is not open"));
    }
    if helper_id == request.owner_id {
        return Err(LifecycleError::CannotOfferOwnRequest);
    }
    if existing_offers
        .iter()
        .any(|o| o.helper_id == helper_id && o.status.is_active())
    {
        return Err(LifecycleError::DuplicateOffer);
    }
    Ok(())
}

/// The request owner accepts one pending offer. Siblings still pending are
/// auto-rejected and the request advances to `in_progress`; the caller must
/// apply all of it in a single transaction.
pub fn accept_offer(
    request: &RequestSnapshot,
    offer: &OfferSnapshot,
    caller_id: Uuid,
) -> Result<(), LifecycleError> {
    if caller_id != request.owner_id {
        return Err(LifecycleError::Unauthorized);
    }
    if offer.status != OfferStatus::Pending {
        return Err(LifecycleError::InvalidState("offer is not pending"));
    }
    if request.status != RequestStatus::Open {
        return Err(LifecycleError::InvalidState("request is not open"));
    }
    Ok(())
}

pub fn reject_offer(
    request: &RequestSnapshot,
    offer: &OfferSnapshot,
    caller_id: Uuid,
) -> Result<(), LifecycleError> {
    if caller_id != request.owner_id {
        return Err(LifecycleError::Unauthorized);
    }
    if offer.status != OfferStatus::Pending {
        return Err(LifecycleError::InvalidState("offer is not pending"));
    }
    Ok(())
}

/// Either party confirms the physical handoff.
pub fn mark_borrowed(
    request: &RequestSnapshot,
    offer: &OfferSnapshot,
    caller_id: Uuid,
) -> Result<(), LifecycleError> {
    if caller_id != request.owner_id && caller_id != offer.helper_id {
        return Err(LifecycleError::Unauthorized);
    }
    if offer.status != OfferStatus::Accepted {
        return Err(LifecycleError::InvalidState("offer is not accepted"));
    }
    Ok(())
}

/// The owner confirms the item is back; closes the request. Applied together
/// with the request update in one transaction.
pub fn mark_returned(
    request: &RequestSnapshot,
    offer: &OfferSnapshot,
    caller_id: Uuid,
) -> Result<(), LifecycleError> {
    if caller_id != request.owner_id {
        return Err(LifecycleError::Unauthorized);
    }
    if offer.status != OfferStatus::Borrowed {
        return Err(LifecycleError::InvalidState("offer is not borrowed"));
    }
    Ok(())
}

/// Owner or admin aborts a request that has not completed. All still-active
/// offers move to `cancelled` alongside.
pub fn cancel_request(
    request: &RequestSnapshot,
    caller_id: Uuid,
    caller_role: UserRole,
) -> Result<(), LifecycleError> {
    if caller_id != request.owner_id && caller_role != UserRole::Admin {
        return Err(LifecycleError::Unauthorized);
    }
    if request.status.is_terminal() {
        return Err(LifecycleError::InvalidState("request is already closed"));
    }
    Ok(())
}

/// Which user a review targets and which aggregate it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewTarget {
    pub reviewed_id: Uuid,
    pub review_type: ReviewType,
}

/// Validate a review of the counterparty once the exchange fully completed.
///
/// `existing_types` are the review directions already recorded for this offer.
pub fn submit_review(
    request: &RequestSnapshot,
    offer: &OfferSnapshot,
    reviewer_id: Uuid,
    review_type: ReviewType,
    rating: i32,
    existing_types: &[ReviewType],
) -> Result<ReviewTarget, LifecycleError> {
    if !(1..=5).contains(&rating) {
        return Err(LifecycleError::RatingOutOfRange);
    }
    if offer.status != OfferStatus::Returned {
        return Err(LifecycleError::NotEligible);
    }

    // The direction must match the reviewer's role in the exchange.
    let reviewed_id = match review_type {
        ReviewType::RequesterToHelper if reviewer_id == request.owner_id => offer.helper_id,
        ReviewType::HelperToRequester if reviewer_id == offer.helper_id => request.owner_id,
        _ => return Err(LifecycleError::Unauthorized),
    };

    if existing_types.contains(&review_type) {
        return Err(LifecycleError::DuplicateReview);
    }

    Ok(ReviewTarget { reviewed_id, review_type })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rating::RatingAggregate;

    fn uid(n: u8) -> Uuid {
        Uuid::from_u128(n as u128)
    }

    fn request(owner: Uuid, status: RequestStatus) -> RequestSnapshot {
        RequestSnapshot { id: uid(100), owner_id: owner, status }
    }

    fn offer(id: u8, helper: Uuid, status: OfferStatus) -> OfferSnapshot {
        OfferSnapshot { id: uid(id), request_id: uid(100), helper_id: helper, status }
    }

    /// Tiny in-memory mirror of what the service applies after validation,
    /// used to walk full scenarios through the state machine.
    struct Exchange {
        request: RequestSnapshot,
        offers: Vec<OfferSnapshot>,
        reviews: Vec<ReviewType>,
    }

    impl Exchange {
        fn new(owner: Uuid) -> Self {
            Self {
                request: request(owner, RequestStatus::Open),
                offers: vec![],
                reviews: vec![],
            }
        }

        fn submit(&mut self, id: u8, helper: Uuid) -> Result<(), LifecycleError> {
            let mine: Vec<_> = self
                .offers
                .iter()
                .filter(|o| o.helper_id == helper)
                .copied()
                .collect();
            submit_offer(&self.request, helper, &mine)?;
            self.offers.push(offer(id, helper, OfferStatus::Pending));
            Ok(())
        }

        fn accept(&mut self, id: u8, caller: Uuid) -> Result<(), LifecycleError> {
            let target = *self.offers.iter().find(|o| o.id == uid(id)).unwrap();
            accept_offer(&self.request, &target, caller)?;
            for o in &mut self.offers {
                if o.id == uid(id) {
                    o.status = OfferStatus::Accepted;
                } else if o.status == OfferStatus::Pending {
                    o.status = OfferStatus::Rejected;
                }
            }
            self.request.status = RequestStatus::InProgress;
            Ok(())
        }

        fn borrowed(&mut self, id: u8, caller: Uuid) -> Result<(), LifecycleError> {
            let target = *self.offers.iter().find(|o| o.id == uid(id)).unwrap();
            mark_borrowed(&self.request, &target, caller)?;
            self.offers.iter_mut().find(|o| o.id == uid(id)).unwrap().status =
                OfferStatus::Borrowed;
            Ok(())
        }

        fn returned(&mut self, id: u8, caller: Uuid) -> Result<(), LifecycleError> {
            let target = *self.offers.iter().find(|o| o.id == uid(id)).unwrap();
            mark_returned(&self.request, &target, caller)?;
            self.offers.iter_mut().find(|o| o.id == uid(id)).unwrap().status =
                OfferStatus::Returned;
            self.request.status = RequestStatus::Completed;
            Ok(())
        }

        fn active_commitments(&self) -> usize {
            self.offers
                .iter()
                .filter(|o| matches!(o.status, OfferStatus::Accepted | OfferStatus::Borrowed))
                .count()
        }
    }

    const OWNER: u8 = 1;
    const H1: u8 = 2;
    const H2: u8 = 3;

    #[test]
    fn scenario_a_accept_rejects_siblings() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.submit(11, uid(H2)).unwrap();
        assert!(ex.offers.iter().all(|o| o.status == OfferStatus::Pending));

        ex.accept(10, uid(OWNER)).unwrap();

        assert_eq!(ex.offers[0].status, OfferStatus::Accepted);
        assert_eq!(ex.offers[1].status, OfferStatus::Rejected);
        assert_eq!(ex.request.status, RequestStatus::InProgress);
        assert!(ex.active_commitments() <= 1);
    }

    #[test]
    fn scenario_b_borrow_then_return_completes_request() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.accept(10, uid(OWNER)).unwrap();
        ex.borrowed(10, uid(OWNER)).unwrap();
        ex.returned(10, uid(OWNER)).unwrap();

        assert_eq!(ex.offers[0].status, OfferStatus::Returned);
        assert_eq!(ex.request.status, RequestStatus::Completed);
    }

    #[test]
    fn scenario_c_review_updates_aggregate_and_blocks_duplicates() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.accept(10, uid(OWNER)).unwrap();
        ex.borrowed(10, uid(OWNER)).unwrap();
        ex.returned(10, uid(OWNER)).unwrap();

        let target = submit_review(
            &ex.request,
            &ex.offers[0],
            uid(OWNER),
            ReviewType::RequesterToHelper,
            4,
            &ex.reviews,
        )
        .unwrap();
        assert_eq!(target.reviewed_id, uid(H1));
        ex.reviews.push(target.review_type);

        let helper_rating = RatingAggregate::default().apply(4);
        assert!((helper_rating.average - 4.0).abs() < 1e-9);
        assert_eq!(helper_rating.count, 1);

        let err = submit_review(
            &ex.request,
            &ex.offers[0],
            uid(OWNER),
            ReviewType::RequesterToHelper,
            5,
            &ex.reviews,
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::DuplicateReview);
    }

    #[test]
    fn scenario_d_second_active_offer_is_rejected() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        let err = ex.submit(11, uid(H1)).unwrap_err();
        assert_eq!(err, LifecycleError::DuplicateOffer);
    }

    #[test]
    fn scenario_e_accept_on_in_progress_request_is_invalid() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.submit(11, uid(H2)).unwrap();
        ex.accept(10, uid(OWNER)).unwrap();

        // H2's offer was auto-rejected; even a still-pending offer would be
        // refused because the request left `open`.
        let stale = offer(11, uid(H2), OfferStatus::Pending);
        let err = accept_offer(&ex.request, &stale, uid(OWNER)).unwrap_err();
        assert_eq!(err, LifecycleError::InvalidState("request is not open"));
    }

    #[test]
    fn mark_returned_twice_is_invalid_state() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.accept(10, uid(OWNER)).unwrap();
        ex.borrowed(10, uid(OWNER)).unwrap();
        ex.returned(10, uid(OWNER)).unwrap();

        let err = ex.returned(10, uid(OWNER)).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState(_)));
        assert_eq!(ex.request.status, RequestStatus::Completed);
    }

    #[test]
    fn owner_cannot_offer_on_own_request() {
        let mut ex = Exchange::new(uid(OWNER));
        let err = ex.submit(10, uid(OWNER)).unwrap_err();
        assert_eq!(err, LifecycleError::CannotOfferOwnRequest);
    }

    #[test]
    fn rejected_helper_may_offer_again() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.offers[0].status = OfferStatus::Rejected;
        ex.submit(11, uid(H1)).unwrap();
    }

    #[test]
    fn only_owner_accepts_or_returns() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        assert_eq!(ex.accept(10, uid(H1)).unwrap_err(), LifecycleError::Unauthorized);

        ex.accept(10, uid(OWNER)).unwrap();
        // Helper may confirm the handoff...
        ex.borrowed(10, uid(H1)).unwrap();
        // ...but not the return.
        assert_eq!(ex.returned(10, uid(H1)).unwrap_err(), LifecycleError::Unauthorized);
    }

    #[test]
    fn review_direction_must_match_role() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.accept(10, uid(OWNER)).unwrap();
        ex.borrowed(10, uid(OWNER)).unwrap();
        ex.returned(10, uid(OWNER)).unwrap();

        // The helper cannot file the requester-side review.
        let err = submit_review(
            &ex.request,
            &ex.offers[0],
            uid(H1),
            ReviewType::RequesterToHelper,
            5,
            &[],
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::Unauthorized);

        // A third party cannot review at all.
        let err = submit_review(
            &ex.request,
            &ex.offers[0],
            uid(9),
            ReviewType::HelperToRequester,
            5,
            &[],
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::Unauthorized);
    }

    #[test]
    fn review_before_return_is_not_eligible() {
        let mut ex = Exchange::new(uid(OWNER));
        ex.submit(10, uid(H1)).unwrap();
        ex.accept(10, uid(OWNER)).unwrap();

        let err = submit_review(
            &ex.request,
            &ex.offers[0],
            uid(OWNER),
            ReviewType::RequesterToHelper,
            5,
            &[],
        )
        .unwrap_err();
        assert_eq!(err, LifecycleError::NotEligible);
    }

    #[test]
    fn rating_must_be_one_to_five() {
        let ex = request(uid(OWNER), RequestStatus::Completed);
        let o = offer(10, uid(H1), OfferStatus::Returned);
        for bad in [0, 6, -1] {
            let err =
                submit_review(&ex, &o, uid(OWNER), ReviewType::RequesterToHelper, bad, &[])
                    .unwrap_err();
            assert_eq!(err, LifecycleError::RatingOutOfRange);
        }
    }

    #[test]
    fn cancel_is_allowed_for_owner_and_admin_until_completed() {
        let req = request(uid(OWNER), RequestStatus::Open);
        cancel_request(&req, uid(OWNER), UserRole::User).unwrap();
        cancel_request(&req, uid(9), UserRole::Admin).unwrap();
        assert_eq!(
            cancel_request(&req, uid(9), UserRole::User).unwrap_err(),
            LifecycleError::Unauthorized
        );

        let done = request(uid(OWNER), RequestStatus::Completed);
        assert!(matches!(
            cancel_request(&done, uid(OWNER), UserRole::User).unwrap_err(),
            LifecycleError::InvalidState(_)
        ));
    }
}
