//! Subtree walk over get-next.

use tracing::trace;

use vlsr_types::Oid;

use crate::error::SnmpResult;
use crate::transport::SnmpConnection;
use crate::value::VarBind;

/// Collects every binding below `root`.
///
/// Starting at `root`, get-next is repeated until the returned OID no
/// longer has `root` as prefix or the agent returns an exception value.
/// A request error aborts the walk and is returned; bindings collected so
/// far are discarded.
pub async fn walk(conn: &mut dyn SnmpConnection, root: &Oid) -> SnmpResult<Vec<VarBind>> {
    let mut bindings = Vec::new();
    let mut cursor = root.clone();

    loop {
        let binding = conn.get_next(&cursor).await?;

        if !binding.oid.starts_with(root) || binding.value.is_exception() {
            break;
        }

        // An agent that does not advance would loop forever.
        if binding.oid <= cursor {
            trace!("walk of {} stalled at {}", root, binding.oid);
            break;
        }

        trace!("walk {}: {} = {}", root, binding.oid, binding.value);
        cursor = binding.oid.clone();
        bindings.push(binding);
    }

    Ok(bindings)
}
