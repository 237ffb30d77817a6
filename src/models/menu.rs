use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub description: Option<String>,
}
