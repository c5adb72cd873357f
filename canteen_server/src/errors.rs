use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use canteen_engine::{
    traits::{CartError, CatalogError, OrderManagementError},
    OrderFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("{0}")]
    InsufficientStock(String),
    #[error("{0}")]
    InvalidSignature(String),
    #[error("{0}")]
    StockConflict(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("A dependency of the server failed. {0}")]
    DependencyError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::EmptyCart => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::StockConflict(_) => StatusCode::CONFLICT,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::DependencyError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    ExpiredToken,
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::InsufficientStock { .. } => Self::InsufficientStock(e.to_string()),
            CatalogError::InvalidInput(s) => Self::InvalidInput(s),
            CatalogError::DatabaseError(s) => Self::BackendError(s),
            CatalogError::Timeout(s) => Self::DependencyError(s),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::InvalidQuantity(_) | CartError::Overflow(_) => Self::InvalidInput(e.to_string()),
            CartError::ProductNotFound(_) | CartError::LineNotFound { .. } => Self::NoRecordFound(e.to_string()),
            CartError::InsufficientStock { .. } => Self::InsufficientStock(e.to_string()),
            CartError::DatabaseError(s) => Self::BackendError(s),
            CartError::Timeout(s) => Self::DependencyError(s),
        }
    }
}

impl From<OrderManagementError> for ServerError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderManagementError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
            OrderManagementError::StockConflict { .. } => Self::StockConflict(e.to_string()),
            OrderManagementError::GatewayReferenceMismatch(_) => Self::InvalidSignature(e.to_string()),
            OrderManagementError::InvalidInput(s) => Self::InvalidInput(s),
            OrderManagementError::DatabaseError(s) => Self::BackendError(s),
            OrderManagementError::Timeout(s) => Self::DependencyError(s),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::EmptyCart => Self::EmptyCart,
            OrderFlowError::InsufficientStock { .. } => Self::InsufficientStock(e.to_string()),
            OrderFlowError::InvalidInput(s) => Self::InvalidInput(s),
            OrderFlowError::InvalidSignature(_) => Self::InvalidSignature(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::StockConflict { .. } => Self::StockConflict(e.to_string()),
            OrderFlowError::InvalidTransition { .. } => Self::InvalidTransition(e.to_string()),
            OrderFlowError::GatewayError(s) => Self::DependencyError(s),
            OrderFlowError::Timeout(s) => Self::DependencyError(s),
            OrderFlowError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}
