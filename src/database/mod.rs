pub mod account_repo;
pub mod friend_list_repo;
pub mod friend_request_repo;
pub mod schema;
pub mod session_repo;
