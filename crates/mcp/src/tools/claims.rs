// Claim tools backed by the identity store

use crate::error::McpResult;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use crate::tools::registry::{
    envelope, json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string,
    json_schema_string_map, parse_arguments, Tool, ToolRegistry,
};
use identity_mcp_core::dto::{
    ClaimCreateDto, ClaimOutgoingDto, ClaimUpdateDto, ClaimsInfoOutgoingDto,
    ClaimsOutgoingDto, ClaimsQueryIncomingDto, null_as_default,
};
use identity_mcp_core::validation::{ensure_ids_match, parse_claim_id, Validate};
use identity_mcp_core::{Claim, ClaimClient, ClaimsQuery, ToolResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const GET_CLAIMS: &str = "identity-get_claims";
pub const GET_CLAIM_DETAILS: &str = "identity-get_claim_details";
pub const CREATE_CLAIM: &str = "identity-create_claim";
pub const UPDATE_CLAIM: &str = "identity-update_claim";
pub const DELETE_CLAIM: &str = "identity-delete_claim";

pub const NO_CLAIMS_FOUND: &str = "No claims found";
pub const CLAIM_NOT_FOUND: &str = "Claim not found";
pub const CLAIM_NOT_CREATED: &str = "Claim was not created";

/// Register all claim tools against one identity store client
pub fn register_claim_tools(registry: &mut ToolRegistry, client: Arc<dyn ClaimClient>) {
    registry.register(Arc::new(GetClaimsTool::new(client.clone())));
    registry.register(Arc::new(GetClaimDetailsTool::new(client.clone())));
    registry.register(Arc::new(CreateClaimTool::new(client.clone())));
    registry.register(Arc::new(UpdateClaimTool::new(client.clone())));
    registry.register(Arc::new(DeleteClaimTool::new(client)));
}

fn claim_properties_schema(with_id: bool) -> serde_json::Value {
    let mut properties = serde_json::json!({
        "type": json_schema_string("Claim type, e.g. email or role"),
        "value": json_schema_string("Claim value"),
        "valueType": json_schema_string("Type of the value, e.g. string"),
        "displayText": json_schema_string("Human readable label"),
        "properties": json_schema_string_map("Optional key/value pairs (at most 50 entries)"),
        "description": json_schema_string("Optional description (max 500 chars)")
    });
    let mut required = vec!["type", "value", "valueType", "displayText"];
    if with_id {
        properties["id"] = json_schema_string("Id of the claim; must match claimId");
        required.insert(0, "id");
    }
    json_schema_object(properties, required)
}

/// Map an optional upstream claim into the envelope
fn claim_envelope(claim: Option<Claim>, missing: &str) -> ToolResult<ClaimOutgoingDto> {
    match claim {
        Some(claim) => ToolResult::success(ClaimOutgoingDto::from(claim)),
        None => ToolResult::warning(missing),
    }
}

/// Tool listing a page of claims
pub struct GetClaimsTool {
    client: Arc<dyn ClaimClient>,
}

impl GetClaimsTool {
    pub fn new(client: Arc<dyn ClaimClient>) -> Self {
        Self { client }
    }

    async fn run(&self, dto: ClaimsQueryIncomingDto) -> ToolResult<ClaimsOutgoingDto> {
        if let Err(errors) = dto.validate() {
            return ToolResult::validation_failed(errors.into_messages());
        }

        let query = ClaimsQuery::from(&dto);
        info!(skipped = query.skipped, number_of = query.number_of, "Retrieving claims");

        let claims = match self.client.load_claims(&query).await {
            Ok(Some(claims)) => claims,
            Ok(None) => {
                warn!("No claims returned by the identity store");
                return ToolResult::warning(NO_CLAIMS_FOUND);
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Error occurred while retrieving claims");
                return ToolResult::from_error(&e);
            }
        };

        let claims_info = if dto.with_claims_info {
            match self.client.claims_info().await {
                Ok(info) => info.map(ClaimsInfoOutgoingDto::from),
                Err(e) => {
                    error!(error = %format!("{e:#}"), "Error occurred while retrieving claims info");
                    return ToolResult::from_error(&e);
                }
            }
        } else {
            None
        };

        let claims: Vec<ClaimOutgoingDto> = claims.into_iter().map(ClaimOutgoingDto::from).collect();
        info!(count = claims.len(), "Retrieved claims");

        ToolResult::success(ClaimsOutgoingDto {
            claims,
            claims_info,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetClaimsArgs {
    #[serde(default)]
    query_incoming_dto: Option<ClaimsQueryIncomingDto>,
}

#[async_trait::async_trait]
impl Tool for GetClaimsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_CLAIMS.to_string(),
            description: "Retrieve a list of claims.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "queryIncomingDto": json_schema_object(
                        serde_json::json!({
                            "skipped": json_schema_integer("Number of claims to skip (default 0)"),
                            "numberOf": json_schema_integer("Page size, at most 100 (default 50)"),
                            "withClaimsInfo": json_schema_boolean("Also return the total claim count")
                        }),
                        vec![],
                    )
                }),
                vec![],
            ),
            annotations: Some(ToolAnnotations::read_only()),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: GetClaimsArgs = parse_arguments(GET_CLAIMS, arguments)?;
        envelope(&self.run(args.query_incoming_dto.unwrap_or_default()).await)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimIdArgs {
    #[serde(default, deserialize_with = "null_as_default")]
    claim_id: String,
}

/// Tool returning a single claim
pub struct GetClaimDetailsTool {
    client: Arc<dyn ClaimClient>,
}

impl GetClaimDetailsTool {
    pub fn new(client: Arc<dyn ClaimClient>) -> Self {
        Self { client }
    }

    async fn run(&self, raw_id: &str) -> ToolResult<ClaimOutgoingDto> {
        let id = match parse_claim_id(raw_id) {
            Ok(id) => id,
            Err(message) => return ToolResult::validation_failed([message]),
        };

        match self.client.load_claim(&id).await {
            Ok(claim) => {
                if claim.is_none() {
                    warn!(claim_id = %id, "Claim not found");
                }
                claim_envelope(claim, CLAIM_NOT_FOUND)
            }
            Err(e) => {
                error!(claim_id = %id, error = %format!("{e:#}"), "Error occurred while retrieving claim details");
                ToolResult::from_error(&e)
            }
        }
    }
}

#[async_trait::async_trait]
impl Tool for GetClaimDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_CLAIM_DETAILS.to_string(),
            description: "Retrieve details for a single claim by id.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "claimId": json_schema_string("The id of the claim to get details for")
                }),
                vec!["claimId"],
            ),
            annotations: Some(ToolAnnotations::read_only()),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: ClaimIdArgs = parse_arguments(GET_CLAIM_DETAILS, arguments)?;
        envelope(&self.run(&args.claim_id).await)
    }
}

/// Tool creating a claim
pub struct CreateClaimTool {
    client: Arc<dyn ClaimClient>,
}

impl CreateClaimTool {
    pub fn new(client: Arc<dyn ClaimClient>) -> Self {
        Self { client }
    }

    async fn run(&self, dto: ClaimCreateDto) -> ToolResult<ClaimOutgoingDto> {
        if let Err(errors) = dto.validate() {
            return ToolResult::validation_failed(errors.into_messages());
        }

        let claim = Claim::from(dto);
        info!(claim_type = %claim.claim_type, "Creating claim");

        match self.client.create_claim(&claim).await {
            Ok(created) => {
                if created.is_none() {
                    warn!("Identity store returned no created claim");
                }
                claim_envelope(created, CLAIM_NOT_CREATED)
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Error occurred while creating claim");
                ToolResult::from_error(&e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateClaimArgs {
    #[serde(default, deserialize_with = "null_as_default")]
    claim_dto: ClaimCreateDto,
}

#[async_trait::async_trait]
impl Tool for CreateClaimTool {
    fn schema(&self) -> ToolSchema {
        let mut claim_dto = claim_properties_schema(false);
        claim_dto["description"] =
            serde_json::json!("The data for the new claim. The server will assign the id.");

        ToolSchema {
            name: CREATE_CLAIM.to_string(),
            description: "Create a new claim.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({ "claimDto": claim_dto }),
                vec!["claimDto"],
            ),
            annotations: Some(ToolAnnotations::write(false, false)),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: CreateClaimArgs = parse_arguments(CREATE_CLAIM, arguments)?;
        envelope(&self.run(args.claim_dto).await)
    }
}

/// Tool updating an existing claim
pub struct UpdateClaimTool {
    client: Arc<dyn ClaimClient>,
}

impl UpdateClaimTool {
    pub fn new(client: Arc<dyn ClaimClient>) -> Self {
        Self { client }
    }

    async fn run(&self, raw_id: &str, dto: ClaimUpdateDto) -> ToolResult<ClaimOutgoingDto> {
        let id = match parse_claim_id(raw_id) {
            Ok(id) => id,
            Err(message) => return ToolResult::validation_failed([message]),
        };
        if let Err(message) = ensure_ids_match(&id, &dto.id) {
            return ToolResult::validation_failed([message]);
        }
        if let Err(errors) = dto.validate() {
            return ToolResult::validation_failed(errors.into_messages());
        }

        let claim = Claim::from(dto);
        info!(claim_id = %id, "Updating claim");

        match self.client.update_claim(&id, &claim).await {
            Ok(updated) => {
                if updated.is_none() {
                    warn!(claim_id = %id, "Claim not found");
                }
                claim_envelope(updated, CLAIM_NOT_FOUND)
            }
            Err(e) => {
                error!(claim_id = %id, error = %format!("{e:#}"), "Error occurred while updating claim");
                ToolResult::from_error(&e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateClaimArgs {
    #[serde(default, deserialize_with = "null_as_default")]
    claim_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    claim_dto: ClaimUpdateDto,
}

#[async_trait::async_trait]
impl Tool for UpdateClaimTool {
    fn schema(&self) -> ToolSchema {
        let mut claim_dto = claim_properties_schema(true);
        claim_dto["description"] = serde_json::json!(
            "The data to update the claim. The id in the body must match claimId."
        );

        ToolSchema {
            name: UPDATE_CLAIM.to_string(),
            description: "Update a claim by id.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "claimId": json_schema_string("The id of the claim to update"),
                    "claimDto": claim_dto
                }),
                vec!["claimId", "claimDto"],
            ),
            annotations: Some(ToolAnnotations::write(false, true)),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: UpdateClaimArgs = parse_arguments(UPDATE_CLAIM, arguments)?;
        envelope(&self.run(&args.claim_id, args.claim_dto).await)
    }
}

/// Tool deleting a claim
pub struct DeleteClaimTool {
    client: Arc<dyn ClaimClient>,
}

impl DeleteClaimTool {
    pub fn new(client: Arc<dyn ClaimClient>) -> Self {
        Self { client }
    }

    async fn run(&self, raw_id: &str) -> ToolResult<ClaimOutgoingDto> {
        let id = match parse_claim_id(raw_id) {
            Ok(id) => id,
            Err(message) => return ToolResult::validation_failed([message]),
        };

        info!(claim_id = %id, "Deleting claim");
        match self.client.delete_claim(&id).await {
            Ok(deleted) => {
                if deleted.is_none() {
                    warn!(claim_id = %id, "Claim not found");
                }
                claim_envelope(deleted, CLAIM_NOT_FOUND)
            }
            Err(e) => {
                error!(claim_id = %id, error = %format!("{e:#}"), "Error occurred while deleting claim");
                ToolResult::from_error(&e)
            }
        }
    }
}

#[async_trait::async_trait]
impl Tool for DeleteClaimTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: DELETE_CLAIM.to_string(),
            description: "Delete a claim by id.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "claimId": json_schema_string("The id of the claim to delete")
                }),
                vec!["claimId"],
            ),
            annotations: Some(ToolAnnotations::write(true, true)),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let args: ClaimIdArgs = parse_arguments(DELETE_CLAIM, arguments)?;
        envelope(&self.run(&args.claim_id).await)
    }
}
