//! Applies validated lifecycle transitions to the database.
//!
//! Each multi-row cascade (accept with sibling auto-reject, return with
//! request completion, cancel with offer fan-out, review with aggregate
//! recompute) runs inside one diesel transaction, with the status column
//! re-checked in the UPDATE's WHERE clause so a concurrent transition loses
//! cleanly instead of double-applying.

use std::str::FromStr;

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use vizinho_shared::clients::db::DbPool;
use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::UserRole;

use crate::domain::{
    self, lifecycle, OfferSnapshot, OfferStatus, RatingAggregate, RequestSnapshot, RequestStatus,
    ReviewType,
};
use crate::models::{NewOffer, NewReview, Offer, Request, Review, User};
use crate::schema::{offers, requests, reviews, users};

pub struct AcceptOutcome {
    pub offer: Offer,
    pub request: Request,
    pub rejected: Vec<Offer>,
}

pub struct ReturnOutcome {
    pub offer: Offer,
    pub request: Request,
}

pub struct CancelOutcome {
    pub request: Request,
    pub cancelled_offers: Vec<Offer>,
}

pub struct ReviewOutcome {
    pub review: Review,
    pub reviewed: User,
}

fn get_conn(pool: &DbPool) -> AppResult<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })
}

fn load_request(conn: &mut PgConnection, request_id: Uuid) -> AppResult<Request> {
    requests::table
        .find(request_id)
        .first::<Request>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))
}

fn load_offer(conn: &mut PgConnection, offer_id: Uuid) -> AppResult<Offer> {
    offers::table
        .find(offer_id)
        .first::<Offer>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::OfferNotFound, "offer not found"))
}

fn request_snapshot(request: &Request) -> AppResult<RequestSnapshot> {
    Ok(RequestSnapshot {
        id: request.id,
        owner_id: request.user_id,
        status: RequestStatus::from_str(&request.status)
            .map_err(|e| AppError::internal(e))?,
    })
}

fn offer_snapshot(offer: &Offer) -> AppResult<OfferSnapshot> {
    Ok(OfferSnapshot {
        id: offer.id,
        request_id: offer.request_id,
        helper_id: offer.helper_id,
        status: OfferStatus::from_str(&offer.status).map_err(|e| AppError::internal(e))?,
    })
}

/// Reject callers that have been blocked by moderation.
pub fn ensure_not_blocked(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    let blocked: bool = users::table
        .find(user_id)
        .select(users::blocked)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "user not found"))?;

    if blocked {
        return Err(AppError::new(ErrorCode::UserBlocked, "account is blocked"));
    }
    Ok(())
}

/// Create a pending offer on an open request.
pub fn submit_offer(
    pool: &DbPool,
    request_id: Uuid,
    helper_id: Uuid,
    message: Option<String>,
) -> AppResult<(Offer, Request)> {
    let mut conn = get_conn(pool)?;

    ensure_not_blocked(&mut conn, helper_id)?;

    let request = load_request(&mut conn, request_id)?;
    let req_snap = request_snapshot(&request)?;

    let existing: Vec<Offer> = offers::table
        .filter(offers::request_id.eq(request_id))
        .filter(offers::helper_id.eq(helper_id))
        .load::<Offer>(&mut conn)?;
    let existing_snaps = existing
        .iter()
        .map(offer_snapshot)
        .collect::<AppResult<Vec<_>>>()?;

    lifecycle::submit_offer(&req_snap, helper_id, &existing_snaps)?;

    let offer: Offer = diesel::insert_into(offers::table)
        .values(&NewOffer {
            request_id,
            helper_id,
            message,
        })
        .get_result(&mut conn)?;

    tracing::info!(
        offer_id = %offer.id,
        request_id = %request_id,
        helper_id = %helper_id,
        "offer submitted"
    );

    Ok((offer, request))
}

/// Accept one pending offer: reject its pending siblings and advance the
/// request to `in_progress`, all in one transaction.
///
/// The request row is advanced with `WHERE status = 'open'` as an optimistic
/// guard, so two concurrent accepts cannot both win.
pub fn accept_offer(pool: &DbPool, offer_id: Uuid, caller_id: Uuid) -> AppResult<AcceptOutcome> {
    let mut conn = get_conn(pool)?;

    conn.transaction::<AcceptOutcome, AppError, _>(|conn| {
        let offer = load_offer(conn, offer_id)?;
        let request = load_request(conn, offer.request_id)?;

        lifecycle::accept_offer(&request_snapshot(&request)?, &offer_snapshot(&offer)?, caller_id)?;

        let now = Utc::now();

        // Optimistic guard: only one accept can move the request off `open`.
        let advanced = diesel::update(
            requests::table
                .find(request.id)
                .filter(requests::status.eq(RequestStatus::Open.to_string())),
        )
        .set((
            requests::status.eq(RequestStatus::InProgress.to_string()),
            requests::updated_at.eq(now),
        ))
        .get_result::<Request>(conn)
        .optional()?;

        let request = advanced.ok_or_else(|| {
            AppError::invalid_state("request was already taken by another offer")
        })?;

        let accepted = diesel::update(
            offers::table
                .find(offer.id)
                .filter(offers::status.eq(OfferStatus::Pending.to_string())),
        )
        .set((
            offers::status.eq(OfferStatus::Accepted.to_string()),
            offers::accepted_at.eq(now),
        ))
        .get_result::<Offer>(conn)
        .optional()?
        .ok_or_else(|| AppError::invalid_state("offer is no longer pending"))?;

        let rejected: Vec<Offer> = diesel::update(
            offers::table
                .filter(offers::request_id.eq(request.id))
                .filter(offers::id.ne(offer.id))
                .filter(offers::status.eq(OfferStatus::Pending.to_string())),
        )
        .set(offers::status.eq(OfferStatus::Rejected.to_string()))
        .get_results::<Offer>(conn)?;

        tracing::info!(
            offer_id = %accepted.id,
            request_id = %request.id,
            rejected_siblings = rejected.len(),
            "offer accepted"
        );

        Ok(AcceptOutcome { offer: accepted, request, rejected })
    })
}

/// Owner declines a pending offer. No request status change.
pub fn reject_offer(pool: &DbPool, offer_id: Uuid, caller_id: Uuid) -> AppResult<(Offer, Request)> {
    let mut conn = get_conn(pool)?;

    let offer = load_offer(&mut conn, offer_id)?;
    let request = load_request(&mut conn, offer.request_id)?;

    lifecycle::reject_offer(&request_snapshot(&request)?, &offer_snapshot(&offer)?, caller_id)?;

    let rejected = diesel::update(
        offers::table
            .find(offer.id)
            .filter(offers::status.eq(OfferStatus::Pending.to_string())),
    )
    .set(offers::status.eq(OfferStatus::Rejected.to_string()))
    .get_result::<Offer>(&mut conn)
    .optional()?
    .ok_or_else(|| AppError::invalid_state("offer is no longer pending"))?;

    Ok((rejected, request))
}

/// Either party confirms the physical handoff.
pub fn mark_borrowed(pool: &DbPool, offer_id: Uuid, caller_id: Uuid) -> AppResult<Offer> {
    let mut conn = get_conn(pool)?;

    let offer = load_offer(&mut conn, offer_id)?;
    let request = load_request(&mut conn, offer.request_id)?;

    lifecycle::mark_borrowed(&request_snapshot(&request)?, &offer_snapshot(&offer)?, caller_id)?;

    let borrowed = diesel::update(
        offers::table
            .find(offer.id)
            .filter(offers::status.eq(OfferStatus::Accepted.to_string())),
    )
    .set((
        offers::status.eq(OfferStatus::Borrowed.to_string()),
        offers::borrowed_at.eq(Utc::now()),
    ))
    .get_result::<Offer>(&mut conn)
    .optional()?
    .ok_or_else(|| AppError::invalid_state("offer is not accepted"))?;

    Ok(borrowed)
}

/// Owner confirms the item is back: offer → `returned`, request →
/// `completed`, one transaction. Both parties become review-eligible here.
pub fn mark_returned(pool: &DbPool, offer_id: Uuid, caller_id: Uuid) -> AppResult<ReturnOutcome> {
    let mut conn = get_conn(pool)?;

    conn.transaction::<ReturnOutcome, AppError, _>(|conn| {
        let offer = load_offer(conn, offer_id)?;
        let request = load_request(conn, offer.request_id)?;

        lifecycle::mark_returned(&request_snapshot(&request)?, &offer_snapshot(&offer)?, caller_id)?;

        let now = Utc::now();

        let returned = diesel::update(
            offers::table
                .find(offer.id)
                .filter(offers::status.eq(OfferStatus::Borrowed.to_string())),
        )
        .set((
            offers::status.eq(OfferStatus::Returned.to_string()),
            offers::returned_at.eq(now),
        ))
        .get_result::<Offer>(conn)
        .optional()?
        .ok_or_else(|| AppError::invalid_state("offer is not borrowed"))?;

        let request = diesel::update(requests::table.find(request.id))
            .set((
                requests::status.eq(RequestStatus::Completed.to_string()),
                requests::closed_at.eq(now),
                requests::updated_at.eq(now),
            ))
            .get_result::<Request>(conn)?;

        tracing::info!(
            offer_id = %returned.id,
            request_id = %request.id,
            "exchange completed"
        );

        Ok(ReturnOutcome { offer: returned, request })
    })
}

/// Owner or admin aborts the request; still-active offers are cancelled with
/// it, in one transaction.
pub fn cancel_request(
    pool: &DbPool,
    request_id: Uuid,
    caller_id: Uuid,
    caller_role: UserRole,
) -> AppResult<CancelOutcome> {
    let mut conn = get_conn(pool)?;

    conn.transaction::<CancelOutcome, AppError, _>(|conn| {
        let request = load_request(conn, request_id)?;

        lifecycle::cancel_request(&request_snapshot(&request)?, caller_id, caller_role)?;

        let now = Utc::now();

        let request = diesel::update(requests::table.find(request.id))
            .set((
                requests::status.eq(RequestStatus::Cancelled.to_string()),
                requests::closed_at.eq(now),
                requests::updated_at.eq(now),
            ))
            .get_result::<Request>(conn)?;

        let active = [
            OfferStatus::Pending.to_string(),
            OfferStatus::Accepted.to_string(),
            OfferStatus::Borrowed.to_string(),
        ];
        let cancelled_offers: Vec<Offer> = diesel::update(
            offers::table
                .filter(offers::request_id.eq(request.id))
                .filter(offers::status.eq_any(active)),
        )
        .set(offers::status.eq(OfferStatus::Cancelled.to_string()))
        .get_results::<Offer>(conn)?;

        tracing::info!(
            request_id = %request.id,
            cancelled_offers = cancelled_offers.len(),
            "request cancelled"
        );

        Ok(CancelOutcome { request, cancelled_offers })
    })
}

/// Insert a review and fold it into the reviewed user's aggregate in the
/// same transaction (no read-modify-write race on the user row).
pub fn submit_review(
    pool: &DbPool,
    offer_id: Uuid,
    reviewer_id: Uuid,
    review_type: ReviewType,
    rating: i32,
    comment: Option<String>,
) -> AppResult<ReviewOutcome> {
    let mut conn = get_conn(pool)?;

    conn.transaction::<ReviewOutcome, AppError, _>(|conn| {
        let offer = load_offer(conn, offer_id)?;
        let request = load_request(conn, offer.request_id)?;

        let existing: Vec<String> = reviews::table
            .filter(reviews::offer_id.eq(offer_id))
            .select(reviews::review_type)
            .load(conn)?;
        let existing_types = existing
            .iter()
            .map(|s| ReviewType::from_str(s).map_err(AppError::internal))
            .collect::<AppResult<Vec<_>>>()?;

        let target = lifecycle::submit_review(
            &request_snapshot(&request)?,
            &offer_snapshot(&offer)?,
            reviewer_id,
            review_type,
            rating,
            &existing_types,
        )?;

        let review: Review = diesel::insert_into(reviews::table)
            .values(&NewReview {
                offer_id,
                reviewer_id,
                reviewed_id: target.reviewed_id,
                review_type: review_type.to_string(),
                rating,
                comment,
            })
            .get_result(conn)?;

        // Lock the reviewed row so the recompute reads a consistent aggregate.
        let reviewed: User = users::table
            .find(target.reviewed_id)
            .for_update()
            .first(conn)?;

        let reviewed = match review_type {
            ReviewType::RequesterToHelper => {
                let agg = RatingAggregate::new(reviewed.rating_as_helper, reviewed.total_helps)
                    .apply(rating);
                diesel::update(users::table.find(reviewed.id))
                    .set((
                        users::rating_as_helper.eq(agg.average),
                        users::total_helps.eq(agg.count),
                    ))
                    .get_result::<User>(conn)?
            }
            ReviewType::HelperToRequester => {
                let agg =
                    RatingAggregate::new(reviewed.rating_as_requester, reviewed.total_requests)
                        .apply(rating);
                diesel::update(users::table.find(reviewed.id))
                    .set((
                        users::rating_as_requester.eq(agg.average),
                        users::total_requests.eq(agg.count),
                    ))
                    .get_result::<User>(conn)?
            }
        };

        tracing::info!(
            review_id = %review.id,
            offer_id = %offer_id,
            reviewed_id = %reviewed.id,
            rating,
            "review recorded"
        );

        Ok(ReviewOutcome { review, reviewed })
    })
}

/// Guard used by request creation as well.
pub fn validate_new_request(category: &str, urgency: &str) -> AppResult<()> {
    if !domain::is_valid_category(category) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("unknown category: {category}"),
        ));
    }
    domain::Urgency::from_str(urgency)
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;
    Ok(())
}
