//! Software image and payload-encryption class from `show version`.

use std::fmt;

use super::{Fact, degrade};
use crate::error::CollectError;
use crate::session::{DeviceSession, Session};

pub const COMMAND: &str = "show version";
pub const FAILED: &str = "DEVICE VERSION FAILED";

const MARKER: &str = "System image file is";

/// Whether the image carries payload encryption.
///
/// No-payload-encryption images have `npe` somewhere in their name, in any
/// case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClass {
    Pe,
    Npe,
}

impl ImageClass {
    pub fn of(image: &str) -> Self {
        if image.to_ascii_lowercase().contains("npe") {
            ImageClass::Npe
        } else {
            ImageClass::Pe
        }
    }

    /// Fixed-width label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            ImageClass::Pe => "PE ",
            ImageClass::Npe => "NPE",
        }
    }
}

impl fmt::Display for ImageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVersion {
    pub image: String,
    pub class: ImageClass,
}

impl fmt::Display for ImageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.image, self.class)
    }
}

/// Reduce a raw image path such as `"flash:/c2900/c2900.bin"` to the bare
/// image name.
pub fn image_name(raw: &str) -> String {
    let unquoted = raw.replace('"', "");
    let name = unquoted.trim();
    let name = name.strip_suffix(".bin").unwrap_or(name);
    let name = name.rsplit(':').next().unwrap_or(name);
    let name = name.rsplit('/').next().unwrap_or(name);
    name.to_string()
}

pub fn parse(output: &str) -> Result<ImageVersion, CollectError> {
    let start = output
        .find(MARKER)
        .ok_or(CollectError::Parse { marker: MARKER })?
        + MARKER.len();

    let line = output[start..].lines().next().unwrap_or_default();
    let image = image_name(line);
    if image.is_empty() {
        return Err(CollectError::Parse { marker: MARKER });
    }

    Ok(ImageVersion {
        class: ImageClass::of(&image),
        image,
    })
}

pub async fn query<S: Session>(session: &mut S) -> Result<ImageVersion, CollectError> {
    let output = session.send_command(COMMAND).await?;
    parse(&output)
}

pub async fn collect<S: Session>(device: &mut DeviceSession<S>) -> Fact {
    match query(device.session_mut()).await {
        Ok(version) => Fact::Collected(version.to_string()),
        Err(e) => degrade(device.hostname(), "version info", e, FAILED),
    }
}
