/// Who is attempting a guarded operation. Couriers must own the assignment
/// they act on; admins act on any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Courier(u64),
    Admin,
}

impl Actor {
    pub fn describe(&self) -> String {
        match self {
            Actor::Courier(id) => format!("courier:{id}"),
            Actor::Admin => "admin".to_string(),
        }
    }
}
