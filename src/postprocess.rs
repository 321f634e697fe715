//! Post-processing passes over a composed document.

use crate::config::SampleConfig;
use crate::openapi_builder::{CodeSample, OpenApiDocument, Server};
use anyhow::{Context, Result};
use log::{debug, trace};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Attaches code samples found on disk to the operations they belong to.
///
/// For every operation with an `operationId` and every configured language,
/// the file `<dir>/<tag>/<operationId>.<method>.<extension>` is read. Missing
/// files are skipped. A file holding nothing but whitespace (an empty file, or
/// one a template left with a lone newline) counts as empty and is skipped as
/// well; any other content is attached byte for byte, surrounding whitespace
/// included. Found samples are appended to the operation's `x-code-samples`,
/// in language order.
///
/// Returns the number of samples attached.
///
/// # Errors
///
/// Returns an error if a sample file exists but cannot be read.
pub fn attach_code_samples(doc: &mut OpenApiDocument, samples: &SampleConfig) -> Result<usize> {
    let mut attached = 0;

    for (method, operation) in doc.operations_mut() {
        let Some(operation_id) = operation.operation_id.clone() else {
            continue;
        };

        for language in &samples.languages {
            let path = sample_path(samples, &language.tag, &operation_id, method.as_str(), &language.extension);
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    trace!("No sample at {}", path.display());
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read code sample: {}", path.display()))
                }
            };
            if source.trim().is_empty() {
                debug!("Skipping empty sample {}", path.display());
                continue;
            }

            debug!("Attaching {} sample to {}", language.tag, operation_id);
            operation.code_samples.get_or_insert_with(Vec::new).push(CodeSample {
                lang: language.tag.clone(),
                source,
            });
            attached += 1;
        }
    }

    Ok(attached)
}

fn sample_path(samples: &SampleConfig, tag: &str, operation_id: &str, method: &str, extension: &str) -> PathBuf {
    samples
        .dir
        .join(tag)
        .join(format!("{}.{}.{}", operation_id, method, extension))
}

/// Sets the server list of every operation to `servers`.
///
/// Existing per-operation lists are replaced. An empty list leaves the
/// document untouched. Returns the number of operations updated.
pub fn inject_servers(doc: &mut OpenApiDocument, servers: &[Server]) -> usize {
    if servers.is_empty() {
        return 0;
    }

    let mut updated = 0;
    for (_, operation) in doc.operations_mut() {
        operation.servers = Some(servers.to_vec());
        updated += 1;
    }
    updated
}
