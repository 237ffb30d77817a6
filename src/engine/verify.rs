use chrono::Utc;

use crate::engine::lifecycle::{next_status, LifecycleEvent};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::fraud::FraudAlert;
use crate::models::order::{Order, OrderStatus};
use crate::notify::{self, Event};
use crate::state::AppState;

enum Outcome {
    Delivered(Order),
    Wrong { attempts_remaining: u32 },
    JustLocked(FraudAlert),
}

/// Check a presented code against the order's stored PIN.
///
/// The whole read-modify-write runs under the order's map entry, so two
/// concurrent attempts cannot both observe the same pre-increment counter.
/// A locked order rejects immediately without consuming an attempt.
pub fn verify(
    state: &AppState,
    order_id: u64,
    presented: &str,
    actor: Actor,
) -> Result<Order, AppError> {
    let threshold = state.lockout_threshold;

    let outcome = {
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

        if entry.status.is_terminal() {
            return Err(AppError::InvalidTransition {
                from: entry.status,
                event: LifecycleEvent::PinVerified.name(),
            });
        }

        if entry.failed_attempts >= threshold {
            return Err(AppError::Locked);
        }

        if entry.pin == presented {
            let next = next_status(entry.kind, entry.status, LifecycleEvent::PinVerified)?;
            entry.status = next;
            entry.failed_attempts = 0;
            Outcome::Delivered(entry.clone())
        } else {
            entry.failed_attempts += 1;

            if entry.failed_attempts >= threshold {
                let alert = FraudAlert {
                    id: state.next_alert_id(),
                    order_id,
                    flagged_by: actor.describe(),
                    attempts: entry.failed_attempts,
                    resolved: false,
                    created_at: Utc::now(),
                };
                Outcome::JustLocked(alert)
            } else {
                Outcome::Wrong {
                    attempts_remaining: threshold - entry.failed_attempts,
                }
            }
        }
    };

    match outcome {
        Outcome::Delivered(order) => {
            state
                .metrics
                .pin_verifications_total
                .with_label_values(&["success"])
                .inc();
            tracing::info!(order_id, actor = %actor.describe(), "pin verified, order delivered");
            notify::publish(
                state,
                Event::OrderStatusUpdate {
                    order_id,
                    status: OrderStatus::Delivered,
                },
            );
            Ok(order)
        }
        Outcome::Wrong { attempts_remaining } => {
            state
                .metrics
                .pin_verifications_total
                .with_label_values(&["wrong_code"])
                .inc();
            tracing::warn!(order_id, attempts_remaining, "incorrect pin");
            Err(AppError::WrongCode { attempts_remaining })
        }
        Outcome::JustLocked(alert) => {
            state.fraud_alerts.insert(alert.id, alert.clone());
            state
                .metrics
                .pin_verifications_total
                .with_label_values(&["locked"])
                .inc();
            state.metrics.fraud_alerts_total.inc();
            tracing::warn!(
                order_id,
                attempts = alert.attempts,
                flagged_by = %alert.flagged_by,
                "pin attempts exhausted, order locked"
            );
            notify::publish(state, Event::FraudAlert { alert });
            Err(AppError::Locked)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::verify;
    use crate::error::AppError;
    use crate::models::actor::Actor;
    use crate::models::order::{Order, OrderKind, OrderStatus};
    use crate::state::AppState;

    fn state_with_assigned_order(courier_id: u64) -> (Arc<AppState>, u64) {
        let state = Arc::new(AppState::new(64, 2, 3));
        let id = state.next_order_id();
        state.orders.insert(
            id,
            Order {
                id,
                customer_name: "Ravi".to_string(),
                phone: "5550123".to_string(),
                items: vec![],
                total: 480.0,
                kind: OrderKind::Delivery,
                status: OrderStatus::OutForDelivery,
                pin: "5678".to_string(),
                failed_attempts: 0,
                location: None,
                landmark: None,
                payment_ref: None,
                assigned_courier: Some(courier_id),
                created_at: Utc::now(),
            },
        );
        (state, id)
    }

    #[test]
    fn correct_pin_delivers_and_resets_counter() {
        let (state, order) = state_with_assigned_order(1);
        state.orders.get_mut(&order).unwrap().failed_attempts = 2;

        let delivered = verify(&state, order, "5678", Actor::Courier(1)).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.failed_attempts, 0);
    }

    #[test]
    fn wrong_pin_reports_attempts_remaining() {
        let (state, order) = state_with_assigned_order(1);

        let err = verify(&state, order, "1234", Actor::Courier(1)).unwrap_err();
        assert!(matches!(err, AppError::WrongCode { attempts_remaining: 2 }));

        let err = verify(&state, order, "1234", Actor::Courier(1)).unwrap_err();
        assert!(matches!(err, AppError::WrongCode { attempts_remaining: 1 }));
    }

    #[test]
    fn third_failure_locks_and_raises_exactly_one_alert() {
        let (state, order) = state_with_assigned_order(1);

        for _ in 0..2 {
            let _ = verify(&state, order, "1234", Actor::Courier(1));
        }
        assert_eq!(state.fraud_alerts.len(), 0);

        let err = verify(&state, order, "1234", Actor::Courier(1)).unwrap_err();
        assert!(matches!(err, AppError::Locked));
        assert_eq!(state.fraud_alerts.len(), 1);

        let alert = state.fraud_alerts.iter().next().unwrap().value().clone();
        assert_eq!(alert.order_id, order);
        assert_eq!(alert.attempts, 3);
        assert_eq!(alert.flagged_by, "courier:1");
        assert!(!alert.resolved);
    }

    #[test]
    fn locked_order_rejects_even_the_correct_pin_without_consuming_attempts() {
        let (state, order) = state_with_assigned_order(1);

        for _ in 0..3 {
            let _ = verify(&state, order, "1234", Actor::Courier(1));
        }

        let err = verify(&state, order, "5678", Actor::Courier(1)).unwrap_err();
        assert!(matches!(err, AppError::Locked));

        // Counter frozen at the threshold, no extra alert.
        assert_eq!(state.orders.get(&order).unwrap().failed_attempts, 3);
        assert_eq!(state.fraud_alerts.len(), 1);
    }

    #[test]
    fn courier_cannot_verify_someone_elses_order() {
        let (state, order) = state_with_assigned_order(1);

        let err = verify(&state, order, "5678", Actor::Courier(2)).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn admin_verifies_without_owning_the_assignment() {
        let (state, order) = state_with_assigned_order(1);

        let delivered = verify(&state, order, "5678", Actor::Admin).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
    }

    #[test]
    fn delivered_order_rejects_further_verification() {
        let (state, order) = state_with_assigned_order(1);

        verify(&state, order, "5678", Actor::Courier(1)).unwrap();
        let err = verify(&state, order, "5678", Actor::Courier(1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn concurrent_wrong_attempts_serialize_per_order() {
        let (state, order) = state_with_assigned_order(1);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || verify(&state, order, "0000", Actor::Courier(1)))
            })
            .collect();

        for handle in handles {
            let _ = handle.join().unwrap();
        }

        // Three failures, each counted once, one alert at the threshold.
        assert_eq!(state.orders.get(&order).unwrap().failed_attempts, 3);
        assert_eq!(state.fraud_alerts.len(), 1);
    }
}
