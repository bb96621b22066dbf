use super::*;

pub async fn authorize_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(resource_id): Path<String>,
    Json(payload): Json<AuthorizeRequest>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let resource_id = parse_resource_id(resource_id.as_str())?;
    let permission = parse_permission::<F::Permission>(payload.permission.as_str())?;
    let flags = F::ACCESS_POLICY.flags_with_overrides(
        permission,
        payload.ignore_admin_override,
        payload.ignore_public_access_bypass,
    );

    let decision = F::services(&state)
        .for_request(caller)
        .authorization
        .authorize(&caller, resource_id, permission, flags)
        .await?;

    Ok(Json(AccessDecisionResponse::from(decision)))
}

pub async fn authorize_batch_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(payload): Json<AuthorizeBatchRequest>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let resource_ids = payload
        .resource_ids
        .iter()
        .map(|value| parse_resource_id(value.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let permission = payload
        .permission
        .as_deref()
        .map(parse_permission::<F::Permission>)
        .transpose()?;

    let decision = F::services(&state)
        .for_request(caller)
        .authorization
        .authorize_batch(&caller, &resource_ids, permission)
        .await?;

    Ok(Json(AccessDecisionResponse::from(decision)))
}

pub async fn accessible_resources_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<AccessibleResourcesQuery>,
) -> ApiResult<Json<AccessibleResourcesResponse>> {
    let permission = parse_permission::<F::Permission>(query.permission.as_str())?;

    let accessible = F::services(&state)
        .for_request(caller)
        .authorization
        .list_accessible(&caller, permission)
        .await?;

    Ok(Json(AccessibleResourcesResponse::from(accessible)))
}

pub async fn effective_permissions_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(resource_id): Path<String>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let resource_id = parse_resource_id(resource_id.as_str())?;

    let permissions = F::services(&state)
        .for_request(caller)
        .authorization
        .list_effective_permissions(&caller, resource_id)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from_permissions(
        &permissions,
    )))
}
