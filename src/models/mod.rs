pub mod accounts;
pub mod friend_requests;
pub mod sessions;

pub use accounts::AccountRow;
pub use friend_requests::FriendRequestRow;
pub use sessions::SessionRow;
