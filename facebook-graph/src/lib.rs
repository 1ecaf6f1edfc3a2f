//! # facebook-graph
//!
//! Thin client for the Facebook Graph API surface the inbox sync needs:
//! conversation lookup by participant, cursor-paginated message listing, and
//! attachment/message detail fetches used to recover missing media URLs.
//!
//! The [`GraphApi`] trait is the seam: production code uses [`GraphClient`]
//! (reqwest), tests substitute a mock server by overriding the base URL.

mod client;
mod error;
mod types;

pub use client::{GraphApi, GraphClient, DETAIL_TIMEOUT, LIST_TIMEOUT, MAX_PAGES, PAGE_SIZE};
pub use error::GraphApiError;
pub use types::{
    AttachmentList, AttachmentSlot, ImageData, MessagePage, Paging, PagingCursors, Participant,
    ParticipantList, RawAttachment, RemoteMessage, TemplateButton, TemplatePayload, VideoData,
};
