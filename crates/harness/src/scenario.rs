//! The end-to-end contract scenario
//!
//! Stages run in a fixed order because later ones depend on what earlier
//! ones created. The created subject is not kept in any global: `create`
//! returns a [`SubjectFixture`] that dependent stages take as an argument,
//! and `delete` consumes it, leaving only a [`DeletedSubject`] that the
//! deletion checks accept.

use std::fmt;

use reqwest::StatusCode;

use crate::client::{ApiClient, ApiResponse, Session};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::models::{NewSubject, Prediction, PredictionRequest, SubjectId, SubjectRecord};

/// Subject created by the default scenario
pub const DEFAULT_SUBJECT_NOME: &str = "garotaatech";
pub const DEFAULT_SUBJECT_EMAIL: &str = "garotatech@outlook.com";
/// Values the default scenario updates it to
pub const UPDATED_SUBJECT_NOME: &str = "garotatechupdate";
pub const UPDATED_SUBJECT_EMAIL: &str = "garotatechupdate@gmail.com";
/// Prediction input of the default scenario
pub const DEFAULT_PREDICTION_INPUT: [i64; 1] = [5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    CreateSubject,
    RetrieveSubject,
    UpdateSubject,
    ListSubjects,
    DeleteSubject,
    VerifyDeletion,
    VerifyAbsentFromListing,
    PredictionCheck,
}

impl Stage {
    /// Pipeline order
    pub const ALL: [Stage; 9] = [
        Stage::Authenticate,
        Stage::CreateSubject,
        Stage::RetrieveSubject,
        Stage::UpdateSubject,
        Stage::ListSubjects,
        Stage::DeleteSubject,
        Stage::VerifyDeletion,
        Stage::VerifyAbsentFromListing,
        Stage::PredictionCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Authenticate => "authenticate",
            Stage::CreateSubject => "create_subject",
            Stage::RetrieveSubject => "retrieve_subject",
            Stage::UpdateSubject => "update_subject",
            Stage::ListSubjects => "list_subjects",
            Stage::DeleteSubject => "delete_subject",
            Stage::VerifyDeletion => "verify_deletion",
            Stage::VerifyAbsentFromListing => "verify_absent_from_listing",
            Stage::PredictionCheck => "prediction_check",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject that exists on the server
#[derive(Debug, Clone)]
pub struct SubjectFixture {
    pub record: SubjectRecord,
}

impl SubjectFixture {
    pub fn id(&self) -> &SubjectId {
        &self.record.id
    }
}

/// A subject the server acknowledged deleting
#[derive(Debug, Clone)]
pub struct DeletedSubject {
    pub id: SubjectId,
}

/// Parse and check a subject body: `id` non-null, `nome`/`email` as expected
fn expect_subject(
    response: &ApiResponse,
    expected: &NewSubject,
) -> Result<SubjectRecord> {
    let body = response.json()?;
    response.expect_str_eq(&body, "nome", &expected.nome)?;
    response.expect_str_eq(&body, "email", &expected.email)?;

    let id = response.require_field(&body, "id")?;
    if id.is_null() {
        return Err(response.shape("'id' is null"));
    }

    serde_json::from_value(body).map_err(|e| response.shape(format!("not a subject record: {}", e)))
}

/// POST the subject; expect 201 echoing `nome`/`email` with a server `id`
pub async fn create(session: &Session, subject: &NewSubject) -> Result<SubjectFixture> {
    let response = session.create_subject(subject).await?;
    response.expect_status(StatusCode::CREATED)?;
    let record = expect_subject(&response, subject)?;

    tracing::info!(subject_id = %record.id, "Subject created");
    Ok(SubjectFixture { record })
}

/// GET the subject by id; expect 200 with the same `id`
pub async fn retrieve(session: &Session, fixture: &SubjectFixture) -> Result<()> {
    let response = session.get_subject(fixture.id()).await?;
    response.expect_status(StatusCode::OK)?;

    let body = response.json()?;
    let id = response.require_field(&body, "id")?;
    if !fixture.id().matches(id) {
        return Err(response.shape(format!(
            "'id' should be {}, got {}",
            fixture.id().as_value(),
            id
        )));
    }
    Ok(())
}

/// PUT new values; expect 200 reflecting them.
///
/// Only the submitted fields are checked. Whether the API treats PUT as a
/// partial update is not part of the contract asserted here.
pub async fn update(
    session: &Session,
    fixture: SubjectFixture,
    changes: &NewSubject,
) -> Result<SubjectFixture> {
    let response = session.update_subject(fixture.id(), changes).await?;
    response.expect_status(StatusCode::OK)?;

    let body = response.json()?;
    response.expect_str_eq(&body, "nome", &changes.nome)?;
    response.expect_str_eq(&body, "email", &changes.email)?;

    let mut record = fixture.record;
    record.nome = changes.nome.clone();
    record.email = changes.email.clone();
    Ok(SubjectFixture { record })
}

async fn listed_ids(session: &Session) -> Result<(ApiResponse, Vec<serde_json::Value>)> {
    let response = session.list_subjects().await?;
    response.expect_status(StatusCode::OK)?;

    let body = response.json()?;
    let mut ids = Vec::new();
    for entry in response.require_array(&body)? {
        ids.push(response.require_field(entry, "id")?.clone());
    }
    Ok((response, ids))
}

/// GET the collection; expect 200 and the subject's id among the records
pub async fn list_contains(session: &Session, fixture: &SubjectFixture) -> Result<()> {
    let (response, ids) = listed_ids(session).await?;
    if !ids.iter().any(|id| fixture.id().matches(id)) {
        return Err(response.shape(format!(
            "subject {} is missing from the listing",
            fixture.id()
        )));
    }
    Ok(())
}

/// DELETE the subject; expect 204 with no body
pub async fn delete(session: &Session, fixture: SubjectFixture) -> Result<DeletedSubject> {
    let response = session.delete_subject(fixture.id()).await?;
    response.expect_status(StatusCode::NO_CONTENT)?;
    response.expect_empty_body()?;

    tracing::info!(subject_id = %fixture.id(), "Subject deleted");
    Ok(DeletedSubject {
        id: fixture.record.id,
    })
}

/// GET the deleted subject; expect 404
pub async fn verify_deleted(session: &Session, deleted: &DeletedSubject) -> Result<()> {
    let response = session.get_subject(&deleted.id).await?;
    response.expect_status(StatusCode::NOT_FOUND)?;
    Ok(())
}

/// GET the collection; the deleted subject must no longer appear
pub async fn list_excludes(session: &Session, deleted: &DeletedSubject) -> Result<()> {
    let (response, ids) = listed_ids(session).await?;
    if ids.iter().any(|id| deleted.id.matches(id)) {
        return Err(response.shape(format!(
            "deleted subject {} is still listed",
            deleted.id
        )));
    }
    Ok(())
}

/// POST the input; expect 200 and `predicao` as a list of numbers.
///
/// The predicted values themselves are not checked.
pub async fn predict(session: &Session, input: &PredictionRequest) -> Result<Prediction> {
    let response = session.predict(input).await?;
    response.expect_status(StatusCode::OK)?;

    let body = response.json()?;
    let values = response.require_numeric_list(&body, "predicao")?;
    let predicao = values
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::Number(n) => Some(n.clone()),
            _ => None,
        })
        .collect();

    Ok(Prediction { predicao })
}

/// What a scenario run got through
#[derive(Debug, Clone, Default)]
pub struct ScenarioReport {
    pub completed: Vec<Stage>,
    /// Stage that stopped the run, if any
    pub failed_stage: Option<Stage>,
    pub subject_id: Option<SubjectId>,
    pub prediction: Option<Prediction>,
}

impl ScenarioReport {
    pub fn is_complete(&self) -> bool {
        self.completed == Stage::ALL
    }
}

/// A run that stopped early, with everything it got through before failing
#[derive(Debug, thiserror::Error)]
#[error("{stage}: {error}")]
pub struct ScenarioFailure {
    pub stage: Stage,
    pub report: ScenarioReport,
    #[source]
    pub error: HarnessError,
}

/// The composed pipeline with its inputs
#[derive(Debug, Clone)]
pub struct Scenario {
    config: HarnessConfig,
    pub subject: NewSubject,
    pub update: NewSubject,
    pub prediction_input: PredictionRequest,
}

impl Scenario {
    /// The fixed data set: create, rename, and predict on `[5]`
    pub fn default_for(config: HarnessConfig) -> Self {
        Self {
            config,
            subject: NewSubject::new(DEFAULT_SUBJECT_NOME, DEFAULT_SUBJECT_EMAIL),
            update: NewSubject::new(UPDATED_SUBJECT_NOME, UPDATED_SUBJECT_EMAIL),
            prediction_input: PredictionRequest::from_integers(&DEFAULT_PREDICTION_INPUT),
        }
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// A failed run still hands back its report, so callers can see which
    /// stages passed before the one that broke.
    pub async fn run(&self) -> std::result::Result<ScenarioReport, ScenarioFailure> {
        let mut report = ScenarioReport::default();

        match self.run_stages(&mut report).await {
            Ok(()) => {
                tracing::info!(stages = report.completed.len(), "Scenario passed");
                Ok(report)
            }
            Err(error) => {
                let stage = report.failed_stage.unwrap_or(Stage::Authenticate);
                Err(ScenarioFailure {
                    stage,
                    report,
                    error,
                })
            }
        }
    }

    async fn run_stages(&self, report: &mut ScenarioReport) -> Result<()> {
        let session = track(report, Stage::Authenticate, async {
            ApiClient::new(self.config.clone())?.login().await
        })
        .await?;

        let fixture = track(report, Stage::CreateSubject, create(&session, &self.subject)).await?;
        report.subject_id = Some(fixture.id().clone());

        track(report, Stage::RetrieveSubject, retrieve(&session, &fixture)).await?;
        let fixture = track(
            report,
            Stage::UpdateSubject,
            update(&session, fixture, &self.update),
        )
        .await?;
        track(report, Stage::ListSubjects, list_contains(&session, &fixture)).await?;

        let deleted = track(report, Stage::DeleteSubject, delete(&session, fixture)).await?;
        track(report, Stage::VerifyDeletion, verify_deleted(&session, &deleted)).await?;
        track(
            report,
            Stage::VerifyAbsentFromListing,
            list_excludes(&session, &deleted),
        )
        .await?;

        let prediction = track(
            report,
            Stage::PredictionCheck,
            predict(&session, &self.prediction_input),
        )
        .await?;
        report.prediction = Some(prediction);
        Ok(())
    }
}

async fn track<T>(
    report: &mut ScenarioReport,
    stage: Stage,
    step: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tracing::info!(stage = %stage, "Stage started");
    match step.await {
        Ok(value) => {
            report.completed.push(stage);
            tracing::info!(stage = %stage, "Stage passed");
            Ok(value)
        }
        Err(e) => {
            report.failed_stage = Some(stage);
            tracing::error!(
                stage = %stage,
                kind = e.kind(),
                fatal = e.is_fatal(),
                error = %e,
                "Stage failed"
            );
            Err(e)
        }
    }
}
