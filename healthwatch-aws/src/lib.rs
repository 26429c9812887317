//! # healthwatch-aws
//!
//! Small clients for the two AWS query-protocol calls healthwatch needs:
//!
//! - **SNS** [`Publish`](sns::SnsClient::publish) - fan a message out to a topic
//! - **IAM** [`GetUser`](iam::IamClient::get_user_arn) - discover the caller's
//!   own ARN (and from it, the account id)
//!
//! Requests are form-encoded `POST`s signed with AWS Signature Version 4.
//! Credentials come from explicit values or the standard `AWS_*` environment
//! variables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use healthwatch_aws::{Credentials, sns::SnsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SnsClient::builder()
//!         .region("us-east-1")
//!         .credentials(Credentials::from_env()?)
//!         .build()?;
//!
//!     let message_id = client
//!         .publish("arn:aws:sns:us-east-1:019661432785:alerts", r#"{"CheckID":"web"}"#)
//!         .await?;
//!
//!     println!("Published {}", message_id);
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod iam;
mod query;
pub mod signing;
pub mod sns;

pub use credentials::Credentials;
pub use error::AwsError;
pub use iam::IamClient;
pub use sns::SnsClient;
