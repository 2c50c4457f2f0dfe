// Services module for the PetsQRCode backend
// Business logic layer for the application

pub mod auth_provider;
pub mod contact;
pub mod email;
pub mod jwt;
pub mod maintenance;
pub mod pet;
pub mod qr;
pub mod storage;
pub mod subscription;
pub mod user;
pub mod veterinarian;
pub mod waitlist;

// Re-export commonly used services
pub use auth_provider::{AuthProvider, AuthProviderError, GoTrueClient};
pub use contact::ContactService;
pub use email::{EmailError, EmailService};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use maintenance::MaintenanceService;
pub use pet::{AvatarUpload, PetService, MAX_AVATAR_BYTES};
pub use qr::{QrCodeView, QrLinks, QrService};
pub use storage::{ObjectStorage, StorageError, SupabaseStorage};
pub use subscription::{plans, SubscriptionPlan, SubscriptionService};
pub use user::{OnboardingError, PasswordChange, SessionIdentity, UserService};
pub use veterinarian::VeterinarianService;
pub use waitlist::WaitlistService;
