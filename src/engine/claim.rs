use crate::engine::lifecycle::{next_status, LifecycleEvent};
use crate::error::AppError;
use crate::models::courier::ApprovalStatus;
use crate::models::order::{Order, OrderKind, OrderStatus};
use crate::notify::{self, Event};
use crate::state::AppState;

/// Hand one pending delivery order to exactly one courier.
///
/// The decisive check-and-assign runs while holding the order's map entry, so
/// two couriers racing for the same order serialize there and exactly one
/// observes `(Pending, unassigned)`. The active-order cap is read before that
/// lock; the narrow window where the same courier could slip a second claim
/// through is accepted (the cap is advisory, the assignment itself is not).
pub fn claim(state: &AppState, order_id: u64, courier_id: u64) -> Result<Order, AppError> {
    let approved = state
        .couriers
        .get(&courier_id)
        .map(|c| c.approval == ApprovalStatus::Approved)
        .unwrap_or(false);
    if !approved {
        return Err(AppError::Unauthorized(
            "courier is not approved for deliveries".to_string(),
        ));
    }

    let active = state.active_order_count(courier_id);
    if active >= state.max_active_orders {
        state
            .metrics
            .claims_total
            .with_label_values(&["capped"])
            .inc();
        return Err(AppError::TooManyActiveOrders {
            cap: state.max_active_orders,
        });
    }

    let claimed = {
        let mut entry = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        match next_status(entry.kind, entry.status, LifecycleEvent::Claim) {
            Ok(next) if entry.assigned_courier.is_none() => {
                entry.status = next;
                entry.assigned_courier = Some(courier_id);
                entry.clone()
            }
            Ok(_) => {
                // Pending but already assigned: lost the race.
                state
                    .metrics
                    .claims_total
                    .with_label_values(&["conflict"])
                    .inc();
                return Err(AppError::AlreadyClaimed);
            }
            Err(err) => {
                // A delivery order past Pending was taken by someone else; a
                // dine-in or terminal order genuinely has no claim transition.
                if entry.kind == OrderKind::Delivery
                    && matches!(
                        entry.status,
                        OrderStatus::Assigned | OrderStatus::OutForDelivery
                    )
                {
                    state
                        .metrics
                        .claims_total
                        .with_label_values(&["conflict"])
                        .inc();
                    return Err(AppError::AlreadyClaimed);
                }
                return Err(err);
            }
        }
    };

    state
        .metrics
        .claims_total
        .with_label_values(&["success"])
        .inc();
    tracing::info!(order_id, courier_id, "order claimed");

    notify::publish(
        state,
        Event::OrderTaken {
            order_id,
            courier_id,
        },
    );
    notify::publish(
        state,
        Event::OrderStatusUpdate {
            order_id,
            status: claimed.status,
        },
    );

    Ok(claimed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;

    use super::claim;
    use crate::error::AppError;
    use crate::models::courier::{ApprovalStatus, Courier};
    use crate::models::order::{generate_pin, Order, OrderKind, OrderStatus};
    use crate::state::AppState;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(64, 2, 3))
    }

    fn add_courier(state: &AppState, approval: ApprovalStatus) -> u64 {
        let id = state.next_courier_id();
        state.couriers.insert(
            id,
            Courier {
                id,
                full_name: format!("courier {id}"),
                phone: "5550100".to_string(),
                approval,
                created_at: Utc::now(),
            },
        );
        id
    }

    fn add_order(state: &AppState, kind: OrderKind) -> u64 {
        let id = state.next_order_id();
        state.orders.insert(
            id,
            Order {
                id,
                customer_name: "Asha".to_string(),
                phone: "5550123".to_string(),
                items: vec![],
                total: 250.0,
                kind,
                status: OrderStatus::Pending,
                pin: generate_pin(),
                failed_attempts: 0,
                location: None,
                landmark: None,
                payment_ref: None,
                assigned_courier: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    #[test]
    fn approved_courier_claims_pending_delivery_order() {
        let state = state();
        let courier = add_courier(&state, ApprovalStatus::Approved);
        let order = add_order(&state, OrderKind::Delivery);

        let claimed = claim(&state, order, courier).unwrap();
        assert_eq!(claimed.status, OrderStatus::Assigned);
        assert_eq!(claimed.assigned_courier, Some(courier));
    }

    #[test]
    fn unapproved_courier_is_rejected() {
        let state = state();
        let courier = add_courier(&state, ApprovalStatus::Pending);
        let order = add_order(&state, OrderKind::Delivery);

        let err = claim(&state, order, courier).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn second_claim_loses_with_already_claimed() {
        let state = state();
        let first = add_courier(&state, ApprovalStatus::Approved);
        let second = add_courier(&state, ApprovalStatus::Approved);
        let order = add_order(&state, OrderKind::Delivery);

        claim(&state, order, first).unwrap();
        let err = claim(&state, order, second).unwrap_err();
        assert!(matches!(err, AppError::AlreadyClaimed));
    }

    #[test]
    fn dine_in_order_cannot_be_claimed() {
        let state = state();
        let courier = add_courier(&state, ApprovalStatus::Approved);
        let order = add_order(&state, OrderKind::DineIn);

        let err = claim(&state, order, courier).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn cap_blocks_third_active_assignment() {
        let state = state();
        let courier = add_courier(&state, ApprovalStatus::Approved);

        let first = add_order(&state, OrderKind::Delivery);
        let second = add_order(&state, OrderKind::Delivery);
        let third = add_order(&state, OrderKind::Delivery);

        claim(&state, first, courier).unwrap();
        claim(&state, second, courier).unwrap();

        let err = claim(&state, third, courier).unwrap_err();
        assert!(matches!(err, AppError::TooManyActiveOrders { cap: 2 }));
    }

    #[test]
    fn delivering_an_order_frees_cap_headroom() {
        let state = state();
        let courier = add_courier(&state, ApprovalStatus::Approved);

        let first = add_order(&state, OrderKind::Delivery);
        let second = add_order(&state, OrderKind::Delivery);
        let third = add_order(&state, OrderKind::Delivery);

        claim(&state, first, courier).unwrap();
        claim(&state, second, courier).unwrap();

        state.orders.get_mut(&first).unwrap().status = OrderStatus::Delivered;

        let claimed = claim(&state, third, courier).unwrap();
        assert_eq!(claimed.assigned_courier, Some(courier));
    }

    #[test]
    fn concurrent_claims_yield_exactly_one_winner() {
        let state = state();
        let order = add_order(&state, OrderKind::Delivery);

        let couriers: Vec<u64> = (0..8)
            .map(|_| add_courier(&state, ApprovalStatus::Approved))
            .collect();

        let handles: Vec<_> = couriers
            .into_iter()
            .map(|courier| {
                let state = state.clone();
                thread::spawn(move || claim(&state, order, courier))
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => wins += 1,
                Err(AppError::AlreadyClaimed) => conflicts += 1,
                Err(other) => panic!("unexpected claim error: {other}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);

        let winner = state.orders.get(&order).unwrap().assigned_courier;
        assert!(winner.is_some());
    }
}
