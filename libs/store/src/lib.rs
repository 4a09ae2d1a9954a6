pub mod amount;
pub mod client;
pub mod error;
pub mod page;
pub mod utils;
pub mod admin {
    pub mod model;
    pub mod store;
}
pub mod campaign {
    pub mod model;
    pub mod store;
}
pub mod checkpoint {
    pub mod model;
    pub mod store;
}
pub mod donation {
    pub mod model;
    pub mod store;
}
pub mod stats {
    pub mod model;
    pub mod store;
}
pub mod withdrawal {
    pub mod model;
    pub mod store;
}
