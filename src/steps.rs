//! Binds feature-file prose to careers actions and checks.

use crate::browser::BrowserSession;
use crate::config::RunConfig;
use crate::error::{CareersError, Result};
use crate::feature::StepText;
use crate::job_detail::{JobDetailReader, JobLookup};
use crate::navigation::{ApplyOutcome, CareersNavigator};
use crate::test_log::TestLog;
use regex::Regex;
use std::sync::{Arc, LazyLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingField {
    Title,
    Location,
    Identifier,
}

impl ListingField {
    fn label(self) -> &'static str {
        match self {
            ListingField::Title => "title",
            ListingField::Location => "location",
            ListingField::Identifier => "ID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    OpenHomePage,
    NavigateToCareers,
    SearchFor(String),
    OpenFirstResult,
    FieldMatchesListing(ListingField),
    ThirdParagraphSentenceIs(String),
    SecondBulletIs { header: String, expected: String },
    SecondBulletContains { header: String, keyword: String },
    ClickApplyNow,
    ReturnToCareers,
}

struct Pattern {
    regex: Regex,
    bind: fn(&regex::Captures, Option<&str>) -> Option<Step>,
}

fn pattern(expr: &str, bind: fn(&regex::Captures, Option<&str>) -> Option<Step>) -> Pattern {
    Pattern {
        regex: Regex::new(expr).expect("valid step pattern"),
        bind,
    }
}

fn capture(caps: &regex::Captures, i: usize) -> String {
    caps.get(i).map_or_else(String::new, |m| m.as_str().to_string())
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        pattern(r"^the user is on the .+ home page$", |_, _| Some(Step::OpenHomePage)),
        pattern(r"^the user navigates to the Careers page$", |_, _| {
            Some(Step::NavigateToCareers)
        }),
        pattern(r#"^the user searches for "(.*)"$"#, |c, _| {
            Some(Step::SearchFor(capture(c, 1)))
        }),
        pattern(r"^the user clicks on the first job result$", |_, _| {
            Some(Step::OpenFirstResult)
        }),
        pattern(r"^the job (title|location|ID) should match the result listing$", |c, _| {
            let field = match c.get(1)?.as_str() {
                "title" => ListingField::Title,
                "location" => ListingField::Location,
                _ => ListingField::Identifier,
            };
            Some(Step::FieldMatchesListing(field))
        }),
        pattern(
            r"^the job description third paragraph first sentence should be:$",
            |_, doc| Some(Step::ThirdParagraphSentenceIs(doc?.to_string())),
        ),
        pattern(
            r#"^the job description second bullet under "(.*)" should be:$"#,
            |c, doc| {
                Some(Step::SecondBulletIs {
                    header: capture(c, 1),
                    expected: doc?.to_string(),
                })
            },
        ),
        pattern(
            r#"^the job description second bullet under "(.*)" should contain "(.*)"$"#,
            |c, _| {
                Some(Step::SecondBulletContains {
                    header: capture(c, 1),
                    keyword: capture(c, 2),
                })
            },
        ),
        pattern(r"^the user clicks on Apply Now button$", |_, _| {
            Some(Step::ClickApplyNow)
        }),
        pattern(r"^the user is redirected back to the Careers page$", |_, _| {
            Some(Step::ReturnToCareers)
        }),
    ]
});

impl Step {
    /// Finds the step definition for a line of prose.
    ///
    /// Steps ending in `:` take their expected text from the doc string; without
    /// one they do not match.
    pub fn bind(step: &StepText) -> Result<Step> {
        let doc = step.doc_string.as_deref();
        PATTERNS
            .iter()
            .find_map(|p| p.regex.captures(&step.text).and_then(|c| (p.bind)(&c, doc)))
            .ok_or_else(|| {
                CareersError::UndefinedStep(format!("line {}: {} {}", step.line, step.keyword, step.text))
            })
    }
}

/// Binds every step of a scenario, or reports the first one without a definition.
pub fn bind_all(steps: &[StepText]) -> Result<Vec<Step>> {
    steps.iter().map(Step::bind).collect()
}

/// State carried between the steps of one scenario.
pub struct ScenarioContext<S> {
    navigator: CareersNavigator<S>,
    reader: JobDetailReader<S>,
    log: Arc<TestLog>,
    lookup: Option<JobLookup>,
}

impl<S: BrowserSession> ScenarioContext<S> {
    pub fn new(session: Arc<S>, config: Arc<RunConfig>, log: Arc<TestLog>) -> Self {
        Self {
            navigator: CareersNavigator::new(Arc::clone(&session), Arc::clone(&config)),
            reader: JobDetailReader::new(session, config),
            log,
            lookup: None,
        }
    }

    pub fn lookup(&self) -> Option<&JobLookup> {
        self.lookup.as_ref()
    }

    fn opened_job(&self) -> Result<&JobLookup> {
        self.lookup
            .as_ref()
            .ok_or(CareersError::MissingState("an opened job result"))
    }

    pub async fn execute(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::OpenHomePage => {
                let title = self.navigator.open_home_page().await?;
                self.log.log(&format!(
                    "✅ Navigated to home page ({}).",
                    title.as_deref().unwrap_or("untitled")
                ));
            }
            Step::NavigateToCareers => {
                let url = self.navigator.open_careers().await?;
                self.log.log(&format!("✅ Navigated to Careers page: {}", url));
            }
            Step::SearchFor(query) => {
                self.navigator.search(query).await?;
                self.log.log(&format!("✅ Searched for job: {}", query));
            }
            Step::OpenFirstResult => {
                self.lookup = Some(self.reader.open_first_result().await?);
                self.log.log("✅ Clicked on the first job result.");
            }
            Step::FieldMatchesListing(field) => {
                let job = self.opened_job()?;
                let (expected, actual) = match field {
                    ListingField::Title => (&job.listing.title, &job.detail.title),
                    ListingField::Location => (&job.listing.location, &job.detail.location),
                    ListingField::Identifier => (&job.listing.identifier, &job.detail.identifier),
                };
                if expected.trim() != actual.trim() {
                    return Err(CareersError::mismatch(
                        format!("Job {} mismatch", field.label()),
                        expected.trim(),
                        actual.trim(),
                    ));
                }
                self.log.log(&format!(
                    "✅ Job {} matches the result listing.",
                    field.label()
                ));
            }
            Step::ThirdParagraphSentenceIs(expected) => {
                let actual = self
                    .opened_job()?
                    .description
                    .third_paragraph_first_sentence()
                    .ok_or_else(|| {
                        CareersError::mismatch(
                            "Third paragraph not found",
                            expected.trim(),
                            "<fewer than three non-empty paragraphs>",
                        )
                    })?;
                if expected.trim() != actual.trim() {
                    return Err(CareersError::mismatch(
                        "Third paragraph sentence mismatch",
                        expected.trim(),
                        actual.trim(),
                    ));
                }
                self.log.log("✅ Third paragraph sentence validated.");
            }
            Step::SecondBulletIs { header, expected } => {
                let actual = self.second_bullet(header)?;
                if expected.trim() != actual.trim() {
                    return Err(CareersError::mismatch(
                        format!("Bullet under '{}' did not match", header),
                        expected.trim(),
                        actual.trim(),
                    ));
                }
                self.log.log(&format!("✅ Bullet under '{}' matched.", header));
            }
            Step::SecondBulletContains { header, keyword } => {
                let actual = self.second_bullet(header)?;
                if !actual.to_lowercase().contains(&keyword.to_lowercase()) {
                    return Err(CareersError::mismatch(
                        format!("Bullet under '{}' does not contain keyword", header),
                        keyword.as_str(),
                        actual,
                    ));
                }
                self.log.log(&format!(
                    "✅ Bullet under '{}' contains keyword '{}'.",
                    header, keyword
                ));
            }
            Step::ClickApplyNow => match self.navigator.apply().await {
                ApplyOutcome::Navigated(url) => {
                    self.log.log(&format!("✅ Navigated to Apply Now URL: {}", url));
                }
                ApplyOutcome::NotFound => self.log.log("⚠️ Apply Now link was not found."),
                ApplyOutcome::MissingHref => {
                    self.log.log("⚠️ Apply Now link has no destination.")
                }
                ApplyOutcome::Failed(reason) => {
                    self.log.log(&format!("⚠️ Apply Now navigation failed: {}", reason))
                }
            },
            Step::ReturnToCareers => {
                if self.navigator.return_to_careers().await? {
                    self.log.log("✅ Returned to Careers page.");
                } else {
                    self.log
                        .log("⚠️ No Careers page was visited; staying on the current page.");
                }
            }
        }
        Ok(())
    }

    fn second_bullet(&self, header: &str) -> Result<String> {
        self.opened_job()?
            .description
            .second_bullet_for(header)
            .map(str::to_string)
            .ok_or_else(|| {
                CareersError::mismatch(
                    format!("Section '{}' not found", header),
                    header,
                    "<no list with two or more items under this header>",
                )
            })
    }
}
