// src/publisher.rs

use crate::error::PublishError;
use crate::model::Collage;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Serialize;
use std::fs;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Delivers finished collages somewhere people will look at them
pub trait Publisher {
    fn publish(&mut self, collage: &Collage) -> Result<(), PublishError>;
}

#[derive(Serialize)]
struct MessagePayload {
    embeds: Vec<Embed>,
    attachments: Vec<Attachment>,
}

#[derive(Serialize)]
struct Embed {
    title: String,
    color: u32,
    author: EmbedAuthor,
    footer: EmbedFooter,
    image: EmbedImage,
}

#[derive(Serialize)]
struct EmbedAuthor {
    name: String,
}

#[derive(Serialize)]
struct EmbedFooter {
    text: String,
}

#[derive(Serialize)]
struct EmbedImage {
    url: String,
}

#[derive(Serialize)]
struct Attachment {
    id: u32,
    filename: String,
}

/// Posts each collage as an embed with the image attached, through the
/// Discord REST API. One client, and so one connection pool, serves the run.
pub struct DiscordPublisher {
    client: Client,
    api_base: String,
    token: String,
    channel_id: u64,
}

impl DiscordPublisher {
    pub fn new(token: impl Into<String>, channel_id: u64, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            channel_id,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base, self.channel_id)
    }
}

fn attachment_name(collage: &Collage) -> String {
    collage
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("thumbnail.png")
        .to_string()
}

fn build_payload(collage: &Collage, filename: &str) -> MessagePayload {
    MessagePayload {
        embeds: vec![Embed {
            title: collage.title.clone(),
            color: collage.color.to_u32(),
            author: EmbedAuthor { name: collage.author.clone() },
            footer: EmbedFooter { text: collage.footer.clone() },
            image: EmbedImage { url: format!("attachment://{}", filename) },
        }],
        attachments: vec![Attachment { id: 0, filename: filename.to_string() }],
    }
}

impl Publisher for DiscordPublisher {
    fn publish(&mut self, collage: &Collage) -> Result<(), PublishError> {
        let filename = attachment_name(collage);
        let payload = serde_json::to_string(&build_payload(collage, &filename))?;
        let bytes = fs::read(&collage.path)?;

        let file = Part::bytes(bytes).file_name(filename).mime_str("image/png")?;
        let form = Form::new().text("payload_json", payload).part("files[0]", file);

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bot {}", self.token))
            .multipart(form)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(PublishError::Rejected { status, body });
        }

        tracing::info!("Posted '{}' by {} to channel {}", collage.title, collage.author, self.channel_id);
        Ok(())
    }
}

/// Leaves collages on disk and only logs what would have been posted
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    pub published: usize,
}

impl Publisher for DryRunPublisher {
    fn publish(&mut self, collage: &Collage) -> Result<(), PublishError> {
        self.published += 1;
        tracing::info!(
            "[dry run] {} | {} | {} | {} -> {}",
            collage.title,
            collage.author,
            collage.footer,
            collage.color,
            collage.path.display()
        );
        Ok(())
    }
}
