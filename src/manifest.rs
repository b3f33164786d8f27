//! Reference manifest decoder for the standard descriptor format.
//!
//! ```text
//!  header      u16 size, u8 major, u8 minor
//!  descriptor  u16 size, u8 type, u8 pad, body[size - 4]
//!
//!  type 1  interface  u8 vendor_string_id, u8 product_string_id, u8 pad[2]
//!  type 2  string     u8 length, u8 id, u8 text[length]
//!  type 3  bundle     u8 id, u8 class, u8 pad[2]
//!  type 4  cport      u16 id, u8 bundle, u8 protocol
//! ```
//!
//! All multi-byte fields are little-endian.  Descriptor sizes include the
//! descriptor header and may carry trailing padding.

use log::{debug, warn};

use crate::app::ports::ManifestDecoder;
use crate::error::{ManifestError, Result};
use crate::interface::Interface;
use crate::rpc::codec::CONTROL_CLASS;

const HEADER_LEN: usize = 4;
const DESC_HEADER_LEN: usize = 4;
const SUPPORTED_MAJOR: u8 = 0;

const TYPE_INTERFACE: u8 = 0x01;
const TYPE_STRING: u8 = 0x02;
const TYPE_BUNDLE: u8 = 0x03;
const TYPE_CPORT: u8 = 0x04;

/// One parsed descriptor.  String text borrows from the manifest buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor<'a> {
    Interface {
        vendor_string_id: u8,
        product_string_id: u8,
    },
    String {
        id: u8,
        text: &'a [u8],
    },
    Bundle {
        id: u8,
        class: u8,
    },
    Cport {
        id: u16,
        bundle: u8,
        protocol: u8,
    },
}

/// Split a manifest into descriptors, checking every structural field.
pub fn parse(manifest: &[u8]) -> Result<Vec<Descriptor<'_>>, ManifestError> {
    let header = manifest.get(..HEADER_LEN).ok_or(ManifestError::Truncated)?;
    let size = u16::from_le_bytes([header[0], header[1]]);
    let (major, minor) = (header[2], header[3]);

    if usize::from(size) != manifest.len() {
        return Err(ManifestError::SizeMismatch {
            header: size,
            actual: manifest.len(),
        });
    }
    if major > SUPPORTED_MAJOR {
        return Err(ManifestError::UnsupportedVersion { major, minor });
    }

    let mut descriptors = Vec::new();
    let mut rest = &manifest[HEADER_LEN..];

    while !rest.is_empty() {
        let head = rest.get(..DESC_HEADER_LEN).ok_or(ManifestError::Truncated)?;
        let desc_size = usize::from(u16::from_le_bytes([head[0], head[1]]));
        if desc_size < DESC_HEADER_LEN || desc_size > rest.len() {
            return Err(ManifestError::BadDescriptorSize);
        }

        let body = &rest[DESC_HEADER_LEN..desc_size];
        descriptors.push(parse_descriptor(head[2], body)?);
        rest = &rest[desc_size..];
    }

    Ok(descriptors)
}

fn parse_descriptor(kind: u8, body: &[u8]) -> Result<Descriptor<'_>, ManifestError> {
    let need = |len: usize| {
        if body.len() < len {
            Err(ManifestError::BadDescriptorSize)
        } else {
            Ok(())
        }
    };

    match kind {
        TYPE_INTERFACE => {
            need(2)?;
            Ok(Descriptor::Interface {
                vendor_string_id: body[0],
                product_string_id: body[1],
            })
        }
        TYPE_STRING => {
            need(2)?;
            let len = usize::from(body[0]);
            let text = body.get(2..2 + len).ok_or(ManifestError::BadDescriptorSize)?;
            Ok(Descriptor::String { id: body[1], text })
        }
        TYPE_BUNDLE => {
            need(2)?;
            Ok(Descriptor::Bundle {
                id: body[0],
                class: body[1],
            })
        }
        TYPE_CPORT => {
            need(4)?;
            Ok(Descriptor::Cport {
                id: u16::from_le_bytes([body[0], body[1]]),
                bundle: body[2],
                protocol: body[3],
            })
        }
        other => Err(ManifestError::UnknownDescriptor(other)),
    }
}

/// Decoder for [`parse`]d manifests.  Control-class bundles are skipped:
/// the control connection already exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreybusManifest;

impl GreybusManifest {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestDecoder for GreybusManifest {
    fn decode(&mut self, manifest: &[u8], interface: &mut Interface) -> Result<()> {
        let descriptors = parse(manifest)?;

        let mut interfaces = descriptors.iter().filter_map(|d| match d {
            Descriptor::Interface {
                vendor_string_id,
                product_string_id,
            } => Some((*vendor_string_id, *product_string_id)),
            _ => None,
        });
        let (vendor_id, product_id) = interfaces.next().ok_or(ManifestError::MissingInterface)?;
        if interfaces.next().is_some() {
            return Err(ManifestError::DuplicateInterface.into());
        }

        let vendor = lookup_string(&descriptors, vendor_id)?;
        let product = lookup_string(&descriptors, product_id)?;
        interface.set_descriptor_strings(vendor, product);

        let mut claimed = 0usize;
        for descriptor in &descriptors {
            let Descriptor::Bundle { id, class } = *descriptor else {
                continue;
            };
            if class == CONTROL_CLASS {
                debug!("manifest: skipping control bundle {}", id);
                continue;
            }

            interface.create_bundle(id, class)?;
            for cport in &descriptors {
                if let Descriptor::Cport {
                    id: cport_id,
                    bundle,
                    protocol,
                } = *cport
                {
                    if bundle == id {
                        interface.create_connection(id, cport_id, protocol)?;
                        claimed += 1;
                    }
                }
            }
        }

        let cports = descriptors
            .iter()
            .filter(|d| matches!(d, Descriptor::Cport { .. }))
            .count();
        if claimed < cports {
            warn!(
                "manifest: {} cport descriptor(s) not claimed by any bundle",
                cports - claimed
            );
        }

        Ok(())
    }
}

/// String id 0 means "no string".
fn lookup_string(descriptors: &[Descriptor<'_>], id: u8) -> Result<Option<String>, ManifestError> {
    if id == 0 {
        return Ok(None);
    }

    let text = descriptors
        .iter()
        .find_map(|d| match d {
            Descriptor::String { id: sid, text } if *sid == id => Some(*text),
            _ => None,
        })
        .ok_or(ManifestError::MissingString(id))?;

    core::str::from_utf8(text)
        .map(|s| Some(s.to_owned()))
        .map_err(|_| ManifestError::BadString)
}

/// Builds manifests in the standard format.  Used by tests and fuzz seeds.
///
/// Panics on text or manifests too long for their size fields.
#[derive(Debug, Default, Clone)]
pub struct ManifestBuilder {
    body: Vec<u8>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn descriptor(mut self, kind: u8, body: &[u8]) -> Self {
        let size = u16::try_from(DESC_HEADER_LEN + body.len())
            .expect("descriptor exceeds 64 KiB");
        self.body.extend_from_slice(&size.to_le_bytes());
        self.body.extend_from_slice(&[kind, 0]);
        self.body.extend_from_slice(body);
        self
    }

    pub fn interface(self, vendor_string_id: u8, product_string_id: u8) -> Self {
        self.descriptor(TYPE_INTERFACE, &[vendor_string_id, product_string_id, 0, 0])
    }

    pub fn string(self, id: u8, text: &str) -> Self {
        let len = u8::try_from(text.len()).expect("string descriptor text exceeds 255 bytes");
        let mut body = vec![len, id];
        body.extend_from_slice(text.as_bytes());
        // Pad to a 4-byte boundary.
        while (DESC_HEADER_LEN + body.len()) % 4 != 0 {
            body.push(0);
        }
        self.descriptor(TYPE_STRING, &body)
    }

    pub fn bundle(self, id: u8, class: u8) -> Self {
        self.descriptor(TYPE_BUNDLE, &[id, class, 0, 0])
    }

    pub fn cport(self, id: u16, bundle: u8, protocol: u8) -> Self {
        let [lo, hi] = id.to_le_bytes();
        self.descriptor(TYPE_CPORT, &[lo, hi, bundle, protocol])
    }

    pub fn build(self) -> Vec<u8> {
        let size = u16::try_from(HEADER_LEN + self.body.len()).expect("manifest exceeds 64 KiB");
        let mut out = Vec::with_capacity(usize::from(size));
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&[SUPPORTED_MAJOR, 1]);
        out.extend_from_slice(&self.body);
        out
    }
}
