pub mod account_deletion;
pub mod auth;
pub mod contact;
pub mod maintenance;
pub mod onboarding;
pub mod pet;
pub mod profile;
pub mod qr_code;
pub mod subscription;
pub mod veterinarian;
pub mod waitlist;

// Re-export common types
pub use account_deletion::AccountDeletion;
pub use auth::{AmrEntry, SessionClaims};
pub use contact::{
    ContactChanges, CreateContactRequest, DeleteContactRequest, NewPetContact, PetContact,
    UpdateContactRequest,
};
pub use maintenance::{
    CreateMaintenanceRequest, DeleteMaintenanceRequest, MaintenanceChanges, MaintenanceFrequency,
    NewPetMaintenance, PetMaintenance, UpcomingMaintenance, UpdateMaintenanceRequest,
};
pub use onboarding::{OnboardingForm, PetForm};
pub use pet::{
    ensure_owned, CreatePetRequest, NewPet, Pet, PetChanges, PetWithRelations, UpdatePetRequest,
};
pub use profile::{
    AccountStatus, NewProfile, Profile, ProfileChanges, UpdateProfileRequest, UserAnalytics,
};
pub use qr_code::{LinkQrRequest, QrCode};
pub use subscription::{
    NewPetSubscription, PetSubscription, PetSubscriptionSummary, PlanType, SubscriptionChanges,
    SubscriptionRequest, SubscriptionStatus, UpdateSubscriptionRequest,
};
pub use veterinarian::{
    CreateVeterinarianRequest, DeleteVeterinarianRequest, NewPetVeterinarian, PetVeterinarian,
    UpdateVeterinarianRequest, VeterinarianChanges,
};
pub use waitlist::{JoinWaitlistRequest, WaitlistEntry};
