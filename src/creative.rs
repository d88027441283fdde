//! Creative stage: two images from the summary.
//!
//! Both prompts are built from immutable summary data and the two calls
//! write disjoint halves of the [`ImagePair`], so they run concurrently.
//! Either failure fails the whole stage; a half-filled pair is never built.

use crate::backend::ImageRequest;
use crate::error::{PipelineError, ProviderError, Result};
use crate::exec_ctx::ExecCtx;
use crate::parsing::truncate_chars;
use crate::prompt;
use crate::stage::{BoxFut, Illustrated, Stage, Summarized};
use crate::types::{ArticleSummary, ImageKind, ImagePair, StageName};
use tracing::info;

/// Longest title fragment placed on the social image.
const SOCIAL_TITLE_MAX_CHARS: usize = 60;

const INFOGRAPHIC_TEMPLATE: &str = "Professional management consulting infographic, watercolor style, \
elegant business aesthetics, minimalist layout, soft professional colors (navy blue, gold accents, \
generous white space), title: \"{title}\", key insights shown as callouts with simple icons:\n\
{insights}\n\
clean typography, executive presentation style, consulting firm quality, sophisticated and modern";

const INFOGRAPHIC_NEGATIVE: &str = "low quality, blurry, cartoonish, unprofessional, cluttered, \
bright neon colors, childish design, text overlay errors, distorted text, amateur design";

const SOCIAL_TEMPLATE: &str = "Professional social media post image for management consulting, \
watercolor style, elegant business design, title text: \"{title}\", soft watercolor background in \
navy blue and gold tones, minimalist composition with strategic white space, sophisticated \
consulting branding, clean modern aesthetics suitable for LinkedIn and X, square format, \
centered composition, executive presentation quality";

const SOCIAL_NEGATIVE: &str = "low quality, blurry, unreadable text, cluttered design, amateur \
graphics, bright garish colors, cartoonish elements, distorted or overlapping text";

/// Second stage: summary in, summary plus [`ImagePair`] out.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreativeStage;

impl CreativeStage {
    pub fn new() -> Self {
        Self
    }

    /// The image request for one kind, built from the summary.
    pub fn build_request(&self, ctx: &ExecCtx, summary: &ArticleSummary, kind: ImageKind) -> ImageRequest {
        let title = summary.article.title.as_str();
        let (prompt, options) = match kind {
            ImageKind::Infographic => {
                let insights = prompt::bullet_list(&summary.key_insights);
                (
                    prompt::render(
                        INFOGRAPHIC_TEMPLATE,
                        &prompt::vars([("title", title), ("insights", insights.as_str())]),
                    ),
                    ctx.image_options
                        .clone()
                        .with_negative_prompt(INFOGRAPHIC_NEGATIVE),
                )
            }
            ImageKind::Social => (
                prompt::render(
                    SOCIAL_TEMPLATE,
                    &prompt::vars([("title", truncate_chars(title, SOCIAL_TITLE_MAX_CHARS))]),
                ),
                ctx.image_options
                    .clone()
                    .square()
                    .with_negative_prompt(SOCIAL_NEGATIVE),
            ),
        };
        ImageRequest::new(ctx.image_model.clone(), prompt).with_options(options)
    }

    async fn render(&self, ctx: &ExecCtx, summary: &ArticleSummary, kind: ImageKind) -> Result<Vec<u8>> {
        let request = self.build_request(ctx, summary, kind);
        let response = ctx
            .generate_image(&request)
            .await
            .map_err(|source| PipelineError::ImageGeneration { kind, source })?;
        if response.data.is_empty() {
            return Err(PipelineError::ImageGeneration {
                kind,
                source: ProviderError::MalformedResponse("image payload is empty".into()),
            });
        }
        Ok(response.data)
    }
}

impl Stage for CreativeStage {
    type Input = Summarized;
    type Output = Illustrated;

    fn name(&self) -> StageName {
        StageName::Creative
    }

    fn run<'a>(&'a self, ctx: &'a ExecCtx, input: Summarized) -> BoxFut<'a, Result<Illustrated>> {
        Box::pin(async move {
            let summary = &input.summary;
            let (infographic, social) = futures::try_join!(
                self.render(ctx, summary, ImageKind::Infographic),
                self.render(ctx, summary, ImageKind::Social),
            )?;
            info!(
                infographic_bytes = infographic.len(),
                social_bytes = social.len(),
                "images generated"
            );
            Ok(Illustrated {
                url: input.url,
                summary: input.summary,
                images: ImagePair {
                    infographic,
                    social,
                },
            })
        })
    }
}
