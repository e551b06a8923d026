/// Upload orchestration
///
/// Turns a session's pending content items into atomic assets and,
/// in collection mode, groups them with previously selected assets into
/// a collection.

pub mod checks;
pub mod collection;
pub mod metadata;
pub mod orchestrator;
pub mod poll;
pub mod session;
pub mod template;

pub use checks::{check_preconditions, unmet_preconditions};
pub use collection::{CollectionOutcome, CollectionRequest};
pub use orchestrator::{ItemOutcome, UploadEvent, UploadReport, UploadSettings, Uploader};
pub use poll::{PollPolicy, PollState, Sleeper, TokioSleeper};
pub use session::{
    License, LicenseAmount, LicenseTerms, PaymentMode, UploadContentItem, UploadData,
    UploadSessionState, UploadType,
};
pub use template::{GatewayTemplateSource, TemplateSource};
