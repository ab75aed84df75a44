//! Record types of the blog application.

use crate::model;
use crate::models::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a primary key: a 15-digit millisecond timestamp, a random uuid4
/// in hex and a `000` suffix.
///
/// Keys generated later sort after earlier ones.
pub fn next_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{:015}{}000", millis, uuid::Uuid::new_v4().simple())
}

/// Current time as fractional seconds since the epoch.
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn next_id_value() -> Value {
    Value::String(next_id())
}

fn now_value() -> Value {
    Value::Float(now())
}

model! {
    #[table = "users"]
    pub struct User {
        pub id: Option<String> = string.primary_key().ddl("varchar(50)").default_with(next_id_value),
        pub email: String = string.ddl("varchar(50)"),
        pub passwd: String = string.ddl("varchar(50)"),
        pub admin: bool = boolean,
        pub name: String = string.ddl("varchar(50)"),
        pub image: String = string.ddl("varchar(500)"),
        pub created_at: Option<f64> = float.default_with(now_value),
    }
}

model! {
    #[table = "blogs"]
    pub struct Blog {
        pub id: Option<String> = string.primary_key().ddl("varchar(50)").default_with(next_id_value),
        pub user_id: String = string.ddl("varchar(50)"),
        pub user_name: String = string.ddl("varchar(50)"),
        pub user_image: String = string.ddl("varchar(500)"),
        pub name: String = string.ddl("varchar(50)"),
        pub summary: String = string.ddl("varchar(200)"),
        pub content: String = text,
        pub created_at: Option<f64> = float.default_with(now_value),
    }
}

model! {
    #[table = "comments"]
    pub struct Comment {
        pub id: Option<String> = string.primary_key().ddl("varchar(50)").default_with(next_id_value),
        pub blog_id: String = string.ddl("varchar(50)"),
        pub user_id: String = string.ddl("varchar(50)"),
        pub user_name: String = string.ddl("varchar(50)"),
        pub user_image: String = string.ddl("varchar(500)"),
        pub content: String = text,
        pub created_at: Option<f64> = float.default_with(now_value),
    }
}
