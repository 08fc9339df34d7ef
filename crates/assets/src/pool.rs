//! Bounded worker pool for graphic generation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autocut_plan_model::AssetMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::generator::{GenerationError, ImageGenerator};
use crate::naming::asset_file_stem;
use crate::retry::RetryPolicy;

/// One distinct prompt and every graphic index that asked for it.
#[derive(Debug, Clone, PartialEq)]
struct PromptJob {
    prompt: String,
    indices: Vec<usize>,
}

/// Group `(graphic index, prompt)` requests by prompt, in first-seen order.
fn group_by_prompt(requests: &[(usize, &str)]) -> Vec<PromptJob> {
    let mut jobs: Vec<PromptJob> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for &(index, prompt) in requests {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            tracing::debug!(graphic = index, "Skipping graphic with empty prompt");
            continue;
        }
        match positions.get(prompt) {
            Some(&at) => jobs[at].indices.push(index),
            None => {
                positions.insert(prompt, jobs.len());
                jobs.push(PromptJob {
                    prompt: prompt.to_string(),
                    indices: vec![index],
                });
            }
        }
    }
    jobs
}

/// Generate graphics for `requests`, at most `max_concurrency` at a time.
///
/// Each distinct prompt is generated once; every other index that asked for
/// it gets a link or copy named after that index. Requests that fail after retries leave their
/// indices absent from the returned map; this never fails as a whole.
pub async fn generate_graphics(
    generator: Arc<dyn ImageGenerator>,
    requests: &[(usize, &str)],
    policy: &RetryPolicy,
    max_concurrency: usize,
) -> AssetMap {
    let jobs = group_by_prompt(requests);
    let mut assets = AssetMap::new();
    if jobs.is_empty() {
        return assets;
    }

    tracing::info!(
        generator = generator.name(),
        requests = requests.len(),
        distinct_prompts = jobs.len(),
        max_concurrency,
        "Generating graphics"
    );

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks: JoinSet<(PromptJob, Result<PathBuf, GenerationError>)> = JoinSet::new();

    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        let generator = Arc::clone(&generator);
        let policy = policy.clone();

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return (job, Err(GenerationError::Fatal(format!("worker pool closed: {e}"))))
                }
            };

            let stem = asset_file_stem(job.indices[0], &job.prompt);
            let result = policy
                .run(&job.prompt, |_| {
                    let generator = Arc::clone(&generator);
                    let prompt = job.prompt.clone();
                    let stem = stem.clone();
                    async move { generator.generate(&prompt, &stem).await }
                })
                .await;
            (job, result)
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((job, Ok(path))) => {
                tracing::debug!(prompt = %job.prompt, path = %path.display(), indices = ?job.indices, "Graphic ready");
                let mut indices = job.indices.iter().copied();
                if let Some(first) = indices.next() {
                    assets.insert(first, path.clone());
                }
                for index in indices {
                    let shared = share_with_index(&path, index, &job.prompt).await;
                    assets.insert(index, shared);
                }
            }
            Ok((job, Err(err))) => {
                failed += 1;
                tracing::warn!(prompt = %job.prompt, indices = ?job.indices, error = %err, "Graphic generation failed");
            }
            Err(err) => {
                failed += 1;
                tracing::error!(error = %err, "Graphic generation task panicked");
            }
        }
    }

    tracing::info!(
        generated = assets.len(),
        failed_prompts = failed,
        "Graphic generation finished"
    );
    assets
}

/// Give `index` its own file name for an image generated for another index.
///
/// `AssetMap::discover` reads the graphic index from the file name, so every
/// index sharing a prompt needs a file of its own. Hard-links when possible,
/// copies otherwise; falls back to the shared path if both fail.
async fn share_with_index(shared: &Path, index: usize, prompt: &str) -> PathBuf {
    let extension = shared
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    let target = shared.with_file_name(format!("{}.{extension}", asset_file_stem(index, prompt)));

    let linked = match tokio::fs::hard_link(shared, &target).await {
        Ok(()) => Ok(()),
        Err(_) => tokio::fs::copy(shared, &target).await.map(|_| ()),
    };
    match linked {
        Ok(()) => target,
        Err(err) => {
            tracing::warn!(
                graphic = index,
                shared = %shared.display(),
                error = %err,
                "Could not give graphic its own file; it will not be rediscovered"
            );
            shared.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_prompt_keeps_first_seen_order() {
        let jobs = group_by_prompt(&[(0, "chart"), (1, "map"), (2, " chart "), (3, "  ")]);
        assert_eq!(
            jobs,
            vec![
                PromptJob {
                    prompt: "chart".to_string(),
                    indices: vec![0, 2],
                },
                PromptJob {
                    prompt: "map".to_string(),
                    indices: vec![1],
                },
            ]
        );
    }
}
