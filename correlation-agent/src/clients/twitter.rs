use async_trait::async_trait;
use tracing::{debug, info};
use twitter_v2::authorization::Oauth1aToken;
use twitter_v2::id::NumericId;
use twitter_v2::TwitterApi;

use common::{AgentError, RetryPolicy};

use super::{HistoryReader, Publisher};
use crate::config::TwitterCredentials;
use crate::models::FormattedPost;

const MAX_HISTORY_POSTS: usize = 10;

pub struct TwitterClient {
    api: TwitterApi<Oauth1aToken>,
    username: String,
    user_id: NumericId,
    retry: RetryPolicy,
}

impl TwitterClient {
    /// Authenticates and resolves the account id up front so a bad
    /// credential set fails at startup instead of mid-cycle.
    pub async fn connect(
        credentials: &TwitterCredentials,
        retry: RetryPolicy,
    ) -> Result<Self, AgentError> {
        info!(username = %credentials.username, "initializing Twitter client");

        let auth = Oauth1aToken::new(
            credentials.consumer_key.clone(),
            credentials.consumer_secret.clone(),
            credentials.access_token.clone(),
            credentials.access_secret.clone(),
        );
        let api = TwitterApi::new(auth);

        let user = api
            .get_user_by_username(&credentials.username)
            .send()
            .await
            .map_err(|err| AgentError::Api(format!("Twitter account lookup failed: {err}")))?
            .into_data()
            .ok_or_else(|| {
                AgentError::Api(format!("Twitter account {} not found", credentials.username))
            })?;

        info!(user_id = %user.id, "verified Twitter account");

        Ok(Self {
            api,
            username: credentials.username.clone(),
            user_id: user.id,
            retry,
        })
    }
}

#[async_trait]
impl Publisher for TwitterClient {
    async fn publish(&self, post: &FormattedPost) -> Result<(), AgentError> {
        debug!(len = post.len_chars(), "posting analysis");

        self.retry
            .run("post analysis", || async move {
                self.api
                    .post_tweet()
                    .text(post.text.clone())
                    .send()
                    .await
                    .map_err(|err| AgentError::Api(format!("tweet post failed: {err}")))?;
                Ok(())
            })
            .await?;

        info!("analysis posted");
        Ok(())
    }
}

#[async_trait]
impl HistoryReader for TwitterClient {
    async fn recent_posts(&self) -> Result<Vec<String>, AgentError> {
        let tweets = self
            .api
            .get_user_tweets(self.user_id)
            .max_results(MAX_HISTORY_POSTS)
            .send()
            .await
            .map_err(|err| AgentError::Api(format!("timeline fetch failed: {err}")))?
            .into_data()
            .unwrap_or_default();

        debug!(
            count = tweets.len(),
            username = %self.username,
            "fetched recent posts"
        );
        Ok(tweets.into_iter().map(|tweet| tweet.text).collect())
    }
}
