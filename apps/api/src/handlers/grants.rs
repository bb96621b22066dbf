use super::*;

pub async fn list_grants_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(resource_id): Path<String>,
) -> ApiResult<Json<Vec<GrantResponse>>> {
    let resource_id = parse_resource_id(resource_id.as_str())?;

    let grants = F::services(&state)
        .for_request(caller)
        .grants
        .list_grants(&caller, resource_id)
        .await?
        .into_iter()
        .map(|listing| GrantResponse::from_grant(&listing.grant, Some(listing.granted_at)))
        .collect();

    Ok(Json(grants))
}

pub async fn create_grant_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(resource_id): Path<String>,
    Json(payload): Json<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<GrantResponse>)> {
    let resource_id = parse_resource_id(resource_id.as_str())?;
    let auth_object = payload.auth_object()?;
    let permissions = parse_permission_set::<F::Permission>(&payload.permissions)?;

    let grant = F::services(&state)
        .for_request(caller)
        .grants
        .create_grant(&caller, resource_id, auth_object, permissions)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GrantResponse::from_grant(&grant, None)),
    ))
}

pub async fn provision_creator_grant_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(resource_id): Path<String>,
) -> ApiResult<(StatusCode, Json<GrantResponse>)> {
    let resource_id = parse_resource_id(resource_id.as_str())?;

    let grant = F::services(&state)
        .for_request(caller)
        .grants
        .provision_creator_grant(&caller, resource_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GrantResponse::from_grant(&grant, None)),
    ))
}

pub async fn replace_grant_permissions_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(grant_id): Path<String>,
    Json(payload): Json<ReplaceGrantPermissionsRequest>,
) -> ApiResult<Json<GrantResponse>> {
    let grant_id = parse_grant_id(grant_id.as_str())?;
    let permissions = parse_permission_set::<F::Permission>(&payload.permissions)?;

    let grant = F::services(&state)
        .for_request(caller)
        .grants
        .replace_grant_permissions(&caller, grant_id, permissions)
        .await?;

    Ok(Json(GrantResponse::from_grant(&grant, None)))
}

pub async fn revoke_grant_handler<F: ServedFamily>(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(grant_id): Path<String>,
) -> ApiResult<StatusCode> {
    let grant_id = parse_grant_id(grant_id.as_str())?;

    F::services(&state)
        .for_request(caller)
        .grants
        .revoke_grant(&caller, grant_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
