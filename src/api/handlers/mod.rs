pub mod auth;
pub mod health;
pub mod users;

pub use auth::{login_handler, LoginBody, LoginResponse};
pub use health::{health_handler, HealthResponse};
pub use users::{
    authorize_update, delete_user_handler, get_user_handler, list_users_handler, register_handler,
    update_user_handler, ListUsersQuery, RegisterBody, UpdateUserBody, UserList,
};
