use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::{Order, OrderKind, OrderStatus};
use crate::notify::{self, Event};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Claim,
    StartDelivery,
    PinVerified,
    MarkCompleted,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Claim => "claim",
            LifecycleEvent::StartDelivery => "start delivery",
            LifecycleEvent::PinVerified => "verify pin",
            LifecycleEvent::MarkCompleted => "mark completed",
        }
    }
}

/// The full transition table. Status is never written except with a value
/// returned from here.
pub fn next_status(
    kind: OrderKind,
    current: OrderStatus,
    event: LifecycleEvent,
) -> Result<OrderStatus, AppError> {
    use LifecycleEvent::*;
    use OrderKind::*;
    use OrderStatus::*;

    let next = match (kind, current, event) {
        (Delivery, Pending, Claim) => Assigned,
        (Delivery, Assigned, StartDelivery) => OutForDelivery,
        (Delivery, Assigned | OutForDelivery, PinVerified) => Delivered,
        (DineIn, Pending, MarkCompleted) => Completed,
        (_, from, event) => {
            return Err(AppError::InvalidTransition {
                from,
                event: event.name(),
            })
        }
    };

    Ok(next)
}

/// Move an assigned delivery order to `Out for Delivery`. Couriers may only
/// start their own deliveries; admins may start any.
pub fn start_delivery(state: &AppState, order_id: u64, actor: Actor) -> Result<Order, AppError> {
    let updated = {
        let mut entry = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        if let Actor::Courier(courier_id) = actor {
            if entry.assigned_courier != Some(courier_id) {
                return Err(AppError::Unauthorized(
                    "order is not assigned to you".to_string(),
                ));
            }
        }

        let next = next_status(entry.kind, entry.status, LifecycleEvent::StartDelivery)?;
        entry.status = next;
        entry.clone()
    };

    tracing::info!(order_id, status = %updated.status, "delivery started");
    notify::publish(
        state,
        Event::OrderStatusUpdate {
            order_id,
            status: updated.status,
        },
    );

    Ok(updated)
}

/// Staff marks a dine-in order done.
pub fn complete_dine_in(state: &AppState, order_id: u64) -> Result<Order, AppError> {
    let updated = {
        let mut entry = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

        let next = next_status(entry.kind, entry.status, LifecycleEvent::MarkCompleted)?;
        entry.status = next;
        entry.clone()
    };

    tracing::info!(order_id, "dine-in order completed");
    notify::publish(
        state,
        Event::OrderStatusUpdate {
            order_id,
            status: updated.status,
        },
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::{next_status, LifecycleEvent};
    use crate::error::AppError;
    use crate::models::order::{OrderKind, OrderStatus};

    const ALL_STATUSES: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Assigned,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Completed,
    ];

    const ALL_EVENTS: [LifecycleEvent; 4] = [
        LifecycleEvent::Claim,
        LifecycleEvent::StartDelivery,
        LifecycleEvent::PinVerified,
        LifecycleEvent::MarkCompleted,
    ];

    #[test]
    fn delivery_happy_path() {
        assert_eq!(
            next_status(OrderKind::Delivery, OrderStatus::Pending, LifecycleEvent::Claim).unwrap(),
            OrderStatus::Assigned
        );
        assert_eq!(
            next_status(
                OrderKind::Delivery,
                OrderStatus::Assigned,
                LifecycleEvent::StartDelivery
            )
            .unwrap(),
            OrderStatus::OutForDelivery
        );
        assert_eq!(
            next_status(
                OrderKind::Delivery,
                OrderStatus::OutForDelivery,
                LifecycleEvent::PinVerified
            )
            .unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn pin_verification_also_allowed_straight_from_assigned() {
        assert_eq!(
            next_status(
                OrderKind::Delivery,
                OrderStatus::Assigned,
                LifecycleEvent::PinVerified
            )
            .unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn dine_in_completes_from_pending_only() {
        assert_eq!(
            next_status(
                OrderKind::DineIn,
                OrderStatus::Pending,
                LifecycleEvent::MarkCompleted
            )
            .unwrap(),
            OrderStatus::Completed
        );

        for status in ALL_STATUSES.into_iter().filter(|s| *s != OrderStatus::Pending) {
            assert!(next_status(OrderKind::DineIn, status, LifecycleEvent::MarkCompleted).is_err());
        }
    }

    #[test]
    fn terminal_states_reject_every_event() {
        for kind in [OrderKind::DineIn, OrderKind::Delivery] {
            for status in [OrderStatus::Delivered, OrderStatus::Completed] {
                for event in ALL_EVENTS {
                    let err = next_status(kind, status, event).unwrap_err();
                    assert!(matches!(err, AppError::InvalidTransition { .. }));
                }
            }
        }
    }

    #[test]
    fn dine_in_orders_cannot_enter_the_delivery_path() {
        for event in [
            LifecycleEvent::Claim,
            LifecycleEvent::StartDelivery,
            LifecycleEvent::PinVerified,
        ] {
            for status in ALL_STATUSES {
                assert!(next_status(OrderKind::DineIn, status, event).is_err());
            }
        }
    }

    #[test]
    fn completed_to_assigned_is_unreachable() {
        for kind in [OrderKind::DineIn, OrderKind::Delivery] {
            for event in ALL_EVENTS {
                let result = next_status(kind, OrderStatus::Completed, event);
                assert!(!matches!(result, Ok(OrderStatus::Assigned)));
                assert!(result.is_err());
            }
        }
    }
}
