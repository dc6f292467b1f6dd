//! Domain entities and value objects.

pub mod attachment;
pub mod config;
pub mod newtypes;
pub mod query_params;
pub mod session;
pub mod token;
pub mod tool;
pub mod user;

pub use attachment::{MailFile, MailFolder, ProcessedMessageMetadata};
pub use config::AppConfig;
pub use newtypes::Email;
pub use query_params::{
    DateConstraint, ExcludeParams, FilterParams, Importance, ListCombine, OneOrMany, SelectField, SelectParams,
};
pub use session::SessionSnapshot;
pub use token::{RefreshErrorKind, RefreshOutcome, TokenInfo, TokenRecord};
pub use tool::{Factor, FactorParam, FactorSource, Tool};
pub use user::UserProfile;
pub use user::UserRecord;
