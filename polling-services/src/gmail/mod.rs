//! Gmail implementation of [`MailProvider`](crate::provider::MailProvider).

mod client;

pub use client::GmailProvider;
