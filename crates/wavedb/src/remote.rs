//! Dataset served by a remote HTTP service.
//!
//! `GET {base}/len` answers the window count as a decimal integer,
//! `GET {base}/get/{i}` answers a base64 encoded `AudioExample` holding an
//! `audio` buffer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info};
use wavedb_core::{AudioBuffer, AudioDataset, DatasetError, DatasetResult};

use crate::extract::extract_eager;
use crate::record::AudioRecord;

/// Buffer name in remote payloads.
pub const REMOTE_AUDIO_KEY: &str = "audio";

/// Remote dataset. The length is read once when the session starts.
pub struct RemoteDataset {
    base: String,
    client: reqwest::blocking::Client,
    len: usize,
    channels: usize,
    sample_rate: usize,
}

impl RemoteDataset {
    /// Open a session against `base` and read the dataset length.
    pub fn connect(base: impl Into<String>, channels: usize, sample_rate: usize) -> DatasetResult<Self> {
        let base = base.into().trim_end_matches('/').to_string();
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("wavedb/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DatasetError::Http(format!("failed to create HTTP client: {e}")))?;

        info!("starting remote dataset session: {base}");
        let body = fetch_text(&client, &format!("{base}/len"))?;
        let len = parse_len(&body)?;
        info!(len, "remote dataset connected");

        Ok(Self {
            base,
            client,
            len,
            channels,
            sample_rate,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

fn fetch_text(client: &reqwest::blocking::Client, url: &str) -> DatasetResult<String> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| DatasetError::Http(format!("request to {url} failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(DatasetError::Http(format!("{url} returned {status}")));
    }
    response
        .text()
        .map_err(|e| DatasetError::Http(format!("cannot read body of {url}: {e}")))
}

/// Parse the `len` answer.
pub fn parse_len(body: &str) -> DatasetResult<usize> {
    body.trim()
        .parse()
        .map_err(|_| DatasetError::Remote(format!("remote length '{}' is not an integer", body.trim())))
}

/// Decode a `get` answer into a record.
pub fn decode_payload(body: &str) -> DatasetResult<AudioRecord> {
    let bytes = STANDARD
        .decode(body.trim())
        .map_err(|e| DatasetError::Decode(format!("invalid base64 payload: {e}")))?;
    AudioRecord::decode(&bytes)
}

impl AudioDataset for RemoteDataset {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> DatasetResult<AudioBuffer> {
        if index >= self.len {
            return Err(DatasetError::Index {
                index,
                len: self.len,
            });
        }
        let url = format!("{}/get/{index}", self.base);
        debug!("GET {url}");
        let record = decode_payload(&fetch_text(&self.client, &url)?)?;
        extract_eager(&record, REMOTE_AUDIO_KEY, self.channels, self.sample_rate)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::*;

    #[test]
    fn test_parse_len() {
        assert_eq!(parse_len("1234\n").unwrap(), 1234);
        assert!(matches!(parse_len("<html>"), Err(DatasetError::Remote(_))));
        assert!(parse_len("-3").is_err());
    }

    #[test]
    fn test_decode_payload() {
        let record = AudioRecord::from_metadata([("length", "1")]).with_pcm16(REMOTE_AUDIO_KEY, &[32767, 0], 44100);
        let body = STANDARD.encode(record.encode());
        let decoded = decode_payload(&body).unwrap();
        let buffer = extract_eager(&decoded, REMOTE_AUDIO_KEY, 1, 44100).unwrap();
        assert_eq!(buffer.channel(0), &[1.0, 0.0]);

        assert!(matches!(decode_payload("not base64!"), Err(DatasetError::Decode(_))));
    }
}
