use crate::transformations::activity::{set_activity, ActivityParams};
use crate::transformations::fanout::FanOut;
use crate::transformations::news_feed::handle_news_feed;
use crate::transformations::notifications::handle_notifications;
use crate::transformations::{TransformationContext, TransformationError};
use crate::types::entities::Activity;

/// Record the activity for an event, then fan it out to notifications and
/// news feeds. Nothing fans out when no activity was recorded.
pub async fn emit(
    ctx: &TransformationContext<'_>,
    params: ActivityParams,
    fan_out: FanOut<'_>,
) -> Result<Option<Activity>, TransformationError> {
    let Some(activity) = set_activity(ctx, params).await? else {
        return Ok(None);
    };
    handle_notifications(ctx, &activity, &fan_out).await?;
    handle_news_feed(ctx, &activity, &fan_out).await?;
    Ok(Some(activity))
}
