//! Unified error codes for the storefront
//!
//! This module defines all error codes used by the server and surfaced to clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Account errors (users, addresses)
//! - 4xxx: Order and cart errors
//! - 5xxx: Payment and coupon errors
//! - 6xxx: Catalog errors (products, categories, uploads)
//! - 7xxx: Review errors
//! - 8xxx: Engagement errors (notifications, contact, chat, settings)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Referenced record does not exist
    InvalidReference = 9,
    /// Too many requests from the same client
    TooManyRequests = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Password too short
    PasswordTooShort = 1008,
    /// Email is already registered
    EmailAlreadyRegistered = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Cannot delete own account through admin endpoints
    CannotDeleteSelf = 2006,

    // ==================== 3xxx: Account ====================
    /// User not found
    UserNotFound = 3001,
    /// Address not found
    AddressNotFound = 3101,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is empty
    OrderEmpty = 4007,
    /// Order can no longer be cancelled
    OrderNotCancellable = 4008,
    /// Order cannot be confirmed as delivered
    OrderNotDeliverable = 4009,
    /// Idempotency key already used by another account
    IdempotencyKeyConflict = 4010,
    /// Cart item not found
    CartItemNotFound = 4101,
    /// Cart quantity exceeds available stock
    CartQuantityExceedsStock = 4102,

    // ==================== 5xxx: Payment ====================
    /// Coupon not found
    CouponNotFound = 5101,
    /// Coupon is inactive
    CouponInactive = 5102,
    /// Coupon validity window has not started
    CouponNotStarted = 5103,
    /// Coupon has expired
    CouponExpired = 5104,
    /// Coupon usage limit reached
    CouponUsageExceeded = 5105,
    /// Order value below coupon minimum
    CouponMinOrderNotMet = 5106,
    /// Coupon code already exists
    CouponCodeExists = 5107,

    // ==================== 6xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price
    ProductInvalidPrice = 6002,
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Product is not active
    ProductInactive = 6004,
    /// Product slug already exists
    ProductSlugExists = 6005,
    /// Category not found
    CategoryNotFound = 6101,
    /// Category has products
    CategoryHasProducts = 6102,
    /// Category name already exists
    CategoryNameExists = 6103,

    // ==================== 65xx: File Upload ====================
    /// File too large
    FileTooLarge = 6501,
    /// Unsupported file format
    UnsupportedFileFormat = 6502,
    /// Invalid/corrupted image file
    InvalidImageFile = 6503,
    /// No file provided in request
    NoFileProvided = 6504,
    /// Empty file provided
    EmptyFile = 6505,
    /// No filename provided
    NoFilename = 6506,
    /// Invalid file extension
    InvalidFileExtension = 6507,
    /// Image processing failed
    ImageProcessingFailed = 6508,
    /// File storage failed
    FileStorageFailed = 6509,

    // ==================== 7xxx: Review ====================
    /// Review not found
    ReviewNotFound = 7001,
    /// User already reviewed this product
    ReviewAlreadyExists = 7002,
    /// Only buyers of a delivered order may review
    ReviewNotAllowed = 7003,

    // ==================== 8xxx: Engagement ====================
    /// Notification not found
    NotificationNotFound = 8001,
    /// Contact message not found
    ContactMessageNotFound = 8101,
    /// Chat message is empty
    ChatMessageEmpty = 8201,
    /// Setting not found
    SettingNotFound = 8301,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::InvalidReference => "Referenced record does not exist",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::CannotDeleteSelf => "Cannot delete your own account",

            // Account
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::AddressNotFound => "Address not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderNotCancellable => "Order can no longer be cancelled",
            ErrorCode::OrderNotDeliverable => "Order cannot be confirmed as delivered",
            ErrorCode::IdempotencyKeyConflict => "Idempotency key is already in use",
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CartQuantityExceedsStock => "Requested quantity exceeds available stock",

            // Payment
            ErrorCode::CouponNotFound => "Coupon not found",
            ErrorCode::CouponInactive => "Coupon is not active",
            ErrorCode::CouponNotStarted => "Coupon is not valid yet",
            ErrorCode::CouponExpired => "Coupon has expired",
            ErrorCode::CouponUsageExceeded => "Coupon usage limit reached",
            ErrorCode::CouponMinOrderNotMet => "Order value is below the coupon minimum",
            ErrorCode::CouponCodeExists => "Coupon code already exists",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product has invalid price",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductInactive => "Product is not available",
            ErrorCode::ProductSlugExists => "Product slug already exists",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category has associated products",
            ErrorCode::CategoryNameExists => "Category name already exists",

            // File Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::NoFilename => "No filename provided",
            ErrorCode::InvalidFileExtension => "Invalid file extension",
            ErrorCode::ImageProcessingFailed => "Image processing failed",
            ErrorCode::FileStorageFailed => "File storage failed",

            // Review
            ErrorCode::ReviewNotFound => "Review not found",
            ErrorCode::ReviewAlreadyExists => "You have already reviewed this product",
            ErrorCode::ReviewNotAllowed => "Only customers who received this product can review it",

            // Engagement
            ErrorCode::NotificationNotFound => "Notification not found",
            ErrorCode::ContactMessageNotFound => "Contact message not found",
            ErrorCode::ChatMessageEmpty => "Message must not be empty",
            ErrorCode::SettingNotFound => "Setting not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::InvalidReference),
            10 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::PasswordTooShort),
            1009 => Ok(ErrorCode::EmailAlreadyRegistered),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::CannotDeleteSelf),

            // Account
            3001 => Ok(ErrorCode::UserNotFound),
            3101 => Ok(ErrorCode::AddressNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderNotCancellable),
            4009 => Ok(ErrorCode::OrderNotDeliverable),
            4010 => Ok(ErrorCode::IdempotencyKeyConflict),
            4101 => Ok(ErrorCode::CartItemNotFound),
            4102 => Ok(ErrorCode::CartQuantityExceedsStock),

            // Payment
            5101 => Ok(ErrorCode::CouponNotFound),
            5102 => Ok(ErrorCode::CouponInactive),
            5103 => Ok(ErrorCode::CouponNotStarted),
            5104 => Ok(ErrorCode::CouponExpired),
            5105 => Ok(ErrorCode::CouponUsageExceeded),
            5106 => Ok(ErrorCode::CouponMinOrderNotMet),
            5107 => Ok(ErrorCode::CouponCodeExists),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductInactive),
            6005 => Ok(ErrorCode::ProductSlugExists),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasProducts),
            6103 => Ok(ErrorCode::CategoryNameExists),

            // File Upload
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6503 => Ok(ErrorCode::InvalidImageFile),
            6504 => Ok(ErrorCode::NoFileProvided),
            6505 => Ok(ErrorCode::EmptyFile),
            6506 => Ok(ErrorCode::NoFilename),
            6507 => Ok(ErrorCode::InvalidFileExtension),
            6508 => Ok(ErrorCode::ImageProcessingFailed),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Review
            7001 => Ok(ErrorCode::ReviewNotFound),
            7002 => Ok(ErrorCode::ReviewAlreadyExists),
            7003 => Ok(ErrorCode::ReviewNotAllowed),

            // Engagement
            8001 => Ok(ErrorCode::NotificationNotFound),
            8101 => Ok(ErrorCode::ContactMessageNotFound),
            8201 => Ok(ErrorCode::ChatMessageEmpty),
            8301 => Ok(ErrorCode::SettingNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::InvalidReference.code(), 9);

        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::OrderNotCancellable.code(), 4008);
        assert_eq!(ErrorCode::CouponUsageExceeded.code(), 5105);
        assert_eq!(ErrorCode::ProductOutOfStock.code(), 6003);
        assert_eq!(ErrorCode::ReviewNotAllowed.code(), 7003);
        assert_eq!(ErrorCode::SettingNotFound.code(), 8301);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::InternalError.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(4001), Ok(ErrorCode::OrderNotFound));
        assert_eq!(ErrorCode::try_from(5106), Ok(ErrorCode::CouponMinOrderNotMet));
        assert_eq!(ErrorCode::try_from(9001), Ok(ErrorCode::InternalError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(7002 + 100), Err(InvalidErrorCode(7102)));
        // Retired codes no handler emits
        for retired in [4002, 5003, 9003, 9004, 9005, 9301, 9404] {
            assert_eq!(ErrorCode::try_from(retired), Err(InvalidErrorCode(retired)));
        }
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::NotFound).unwrap();
        assert_eq!(json, "3");

        let json = serde_json::to_string(&ErrorCode::OrderNotFound).unwrap();
        assert_eq!(json, "4001");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6003").unwrap();
        assert_eq!(code, ErrorCode::ProductOutOfStock);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::CouponExpired), "5104");
    }

    #[test]
    fn test_every_code_roundtrips_through_u16() {
        let codes = [
            ErrorCode::TooManyRequests,
            ErrorCode::EmailAlreadyRegistered,
            ErrorCode::CannotDeleteSelf,
            ErrorCode::AddressNotFound,
            ErrorCode::IdempotencyKeyConflict,
            ErrorCode::CartQuantityExceedsStock,
            ErrorCode::CouponCodeExists,
            ErrorCode::ProductSlugExists,
            ErrorCode::FileStorageFailed,
            ErrorCode::ChatMessageEmpty,
            ErrorCode::DatabaseError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }
}
