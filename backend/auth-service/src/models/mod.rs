/// Data models for identity and authentication
pub mod user;

pub use user::{
    LoginRequest, RegisterRequest, Role, SendOtpRequest, UpdateUserRequest, User, UserResponse,
    VerifyOtpRequest,
};
