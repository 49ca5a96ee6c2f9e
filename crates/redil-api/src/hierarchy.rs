//! `GET /hierarchy`: the nested organisational tree under the caller.

use std::sync::Arc;

use axum::{Json, extract::State};
use redil_core::{
  hierarchy::Hierarchy,
  store::Store,
  tree::{self, TreeNode},
};

use crate::{
  auth::Authenticated,
  error::{ApiError, degrade},
};

pub async fn handler<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
) -> Result<Json<Vec<TreeNode>>, ApiError>
where
  S: Store + 'static,
{
  let scope = caller.scope()?;
  let hierarchy = degrade(Hierarchy::load(store.as_ref()).await, "load hierarchy")?;
  Ok(Json(tree::build(&hierarchy, scope)))
}
