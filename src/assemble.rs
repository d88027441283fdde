//! Final stage: turn the outcome of a run into the caller-facing [`Envelope`].
//!
//! Pure: no I/O and no provider calls. Exactly one envelope is produced per
//! run, and a failure envelope never carries partial results.

use crate::error::PipelineError;
use crate::stage::Illustrated;
use crate::types::{
    ArticleView, Envelope, ErrorBody, ImageKind, ImagesView, PostsView, StageRecord, SuccessBody,
};
use url::Url;

/// Build the envelope for `url` from the run outcome.
///
/// `Ok` yields a success envelope with both images base64-encoded. `Err`
/// yields an error envelope whose message is the first error encountered.
pub fn assemble(
    url: &Url,
    outcome: Result<Illustrated, PipelineError>,
    audit_trail: Vec<StageRecord>,
) -> Envelope {
    match outcome {
        Ok(done) => success(done, audit_trail),
        Err(err) => failure(url.as_str(), &err, audit_trail),
    }
}

/// Error envelope reporting `err`. `url` is echoed as given, parsed or not.
pub fn failure(url: &str, err: &PipelineError, audit_trail: Vec<StageRecord>) -> Envelope {
    Envelope::Error(ErrorBody {
        message: err.to_string(),
        kind: err.kind().to_string(),
        url: url.to_string(),
        audit_trail,
    })
}

fn success(done: Illustrated, audit_trail: Vec<StageRecord>) -> Envelope {
    let images = ImagesView {
        infographic: done.images.to_base64(ImageKind::Infographic),
        social: done.images.to_base64(ImageKind::Social),
    };
    let summary = done.summary;
    let url = done.url.to_string();
    Envelope::Success(SuccessBody {
        article: ArticleView {
            title: summary.article.title,
            author: summary.article.author,
            date: summary.article.date,
            url: url.clone(),
        },
        posts: PostsView {
            linkedin: summary.linkedin_post,
            twitter: summary.twitter_post,
            key_insights: summary.key_insights,
        },
        images,
        url,
        audit_trail,
    })
}
