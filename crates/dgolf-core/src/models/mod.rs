//! Data models for DGolf entities.
//!
//! This module contains the structures mirroring the backend JSON:
//!
//! - `User`, `UserPreferences`, `TokenResponse`: accounts and auth payloads
//! - `Destination`: golf travel destinations with pricing and media
//! - `Article`: editorial content linked to destinations
//! - `Inquiry`, `InquiryCreate`: booking inquiries and their lifecycle
//! - `Testimonial`: published customer reviews

pub mod article;
pub mod destination;
pub mod inquiry;
pub mod testimonial;
pub mod upload;
pub mod user;

pub use article::Article;
pub use destination::{Destination, Seo};
pub use inquiry::{Inquiry, InquiryCreate, InquiryNote, InquiryStatus};
pub use testimonial::Testimonial;
pub use upload::StoredFile;
pub use user::{TokenResponse, User, UserPreferences};
