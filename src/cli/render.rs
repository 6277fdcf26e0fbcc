//! Tera-backed renderer for resolved milestone references

use chrono::NaiveDate;
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::warn;

use crate::core::filter::Renderer;
use crate::core::identity::{Iid, MilestoneId, ProjectHandle, ProjectId};
use crate::core::pattern::ReferenceToken;
use crate::core::project::Project;
use crate::entities::{Milestone, MilestoneState};

/// Default link markup
///
/// The `%` sigil in visible text is entity-encoded so the output does not
/// contain raw tokens when filtered again.
pub const DEFAULT_TEMPLATE: &str = concat!(
    r#"<a href="{{ url | safe }}" data-project="{{ project.id }}" "#,
    r#"title="Milestone: {{ milestone.title | escape | replace(from="%", to="&#37;") | safe }}" "#,
    r#"class="gfm gfm-milestone">{{ text | escape | replace(from="%", to="&#37;") | safe }}</a>"#,
);

const TEMPLATE_NAME: &str = "reference.html";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid reference template: {0}")]
    Invalid(String),
}

#[derive(Serialize)]
struct LinkContext<'a> {
    text: &'a str,
    url: String,
    milestone: MilestoneView<'a>,
    project: &'a Project,
}

/// Milestone as seen by templates; `due_date` is always present, null if unset
#[derive(Serialize)]
struct MilestoneView<'a> {
    id: MilestoneId,
    iid: Iid,
    title: &'a str,
    state: MilestoneState,
    due_date: Option<NaiveDate>,
}

impl<'a> From<&'a Milestone> for MilestoneView<'a> {
    fn from(milestone: &'a Milestone) -> Self {
        Self {
            id: milestone.id,
            iid: milestone.iid,
            title: &milestone.title,
            state: milestone.state,
            due_date: milestone.due_date,
        }
    }
}

/// Renders each resolved reference through a Tera template
///
/// Template variables: `text` (the raw token), `url`, `milestone`
/// (`id`, `iid`, `title`, `state`, `due_date`) and `project`
/// (`id`, `handle`, `name`).
pub struct TemplateRenderer {
    tera: Tera,
    base_url: String,
    only_path: bool,
}

impl TemplateRenderer {
    pub fn new(template: &str, base_url: &str, only_path: bool) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)
            .map_err(|e| TemplateError::Invalid(error_chain(&e)))?;

        let renderer = Self {
            tera,
            base_url: base_url.trim_end_matches('/').to_string(),
            only_path,
        };
        renderer.check()?;
        Ok(renderer)
    }

    /// Link target for a milestone
    pub fn url_for(&self, milestone: &Milestone, project: &Project) -> String {
        let path = format!("/{}/-/milestones/{}", project.handle, milestone.iid);
        if self.only_path {
            path
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn render_link(&self, text: &str, milestone: &Milestone, project: &Project) -> Result<String, tera::Error> {
        let link = LinkContext {
            text,
            url: self.url_for(milestone, project),
            milestone: MilestoneView::from(milestone),
            project,
        };
        let context = Context::from_serialize(&link)?;
        self.tera.render(TEMPLATE_NAME, &context)
    }

    /// Render a sample reference so unknown variables fail up front
    ///
    /// Templates that only fail for some milestones get past this check;
    /// those references are left as written at render time.
    fn check(&self) -> Result<(), TemplateError> {
        let project = Project::new(
            ProjectId(1),
            ProjectHandle::parse("namespace/project").map_err(|e| TemplateError::Invalid(e.to_string()))?,
        );
        let milestone = Milestone::new(MilestoneId(1), project.id, Iid(1), "Sample");
        self.render_link("%1", &milestone, &project)
            .map(|_| ())
            .map_err(|e| TemplateError::Invalid(error_chain(&e)))
    }
}

impl Renderer<Milestone> for TemplateRenderer {
    fn render(&mut self, token: &ReferenceToken<'_>, milestone: &Milestone, project: &Project) -> Option<String> {
        self.render_link(token.raw(), milestone, project)
            .map_err(|e| {
                warn!(token = token.raw(), error = %error_chain(&e), "template failed, keeping reference text");
            })
            .ok()
    }
}

/// Tera nests the useful message in the source chain
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
