//! Services module - document persistence, entity lifecycles and the
//! external collaborators they depend on.

pub mod account_service;
pub mod auth;
pub mod connection_service;
pub mod diagram_service;
pub mod document_service;
pub mod functions_client;
pub mod jwt_service;
pub mod layer_service;
pub mod project_service;
pub mod role_service;
pub mod secret_service;

// Re-export for convenience
pub use account_service::AccountService;
pub use auth::{AuthError, AuthProvider, AuthUser, LocalAuthProvider, SessionChange};
pub use connection_service::{ConnectionService, ConnectionTester};
pub use diagram_service::DiagramService;
pub use document_service::{DocumentService, ReadProcessor, WriteProcessor};
pub use functions_client::FunctionsClient;
pub use jwt_service::{Claims, JwtService};
pub use layer_service::LayerService;
pub use project_service::{NewProject, ProjectDeleter, ProjectService};
pub use role_service::RoleService;
pub use secret_service::{ConnectionSecrets, SecretCipher};
