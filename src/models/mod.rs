mod activity;
mod call_log;
mod comment;
mod form_field;
mod lead;
mod newsletter;
mod reminder;
mod role;
mod submission;
mod tag;
mod user;

pub use activity::{ActionKind, ActivityLog};
pub use call_log::CallLog;
pub use comment::Comment;
pub use form_field::{FieldType, FormField};
pub use lead::{
    FollowUpStatus, Lead, Stage, CLOSED_STATUSES, SOURCE_TYPE_WEBSITE, STATUS_NEW, UNASSIGNED,
    WON_STATUSES,
};
pub use newsletter::NewsletterEntry;
pub use reminder::Reminder;
pub use role::{
    default_roles, Capability, PermissionSet, Role, RoleTier, DEFAULT_HIERARCHY_LEVEL,
    ROLE_ADMIN, ROLE_MARKETING, ROLE_SALES_EXECUTIVE, ROLE_SALES_MANAGER,
};
pub use submission::{FormSubmission, Submission, SubmissionStatus};
pub use tag::{EntityTag, Tag, DEFAULT_TAG_COLOR};
pub use user::{User, UserProfile};
