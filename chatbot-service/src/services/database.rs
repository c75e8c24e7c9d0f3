//! MongoDB-backed implementation of the user and message stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};

use crate::error::AppError;
use crate::models::{Message, User};
use crate::services::store::{MessageStore, UserStore};

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        // Usernames are unique case-insensitively, via the lower-cased form.
        let username_index = IndexModel::builder()
            .keys(doc! { "username_lower": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_lower_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users()
            .create_index(username_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create username_lower index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // Serves the conversation listings and the recent-history window.
        let conversation_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "conversation_id": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_conversation_time_idx".to_string())
                    .build(),
            )
            .build();

        self.messages()
            .create_index(conversation_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_conversation_time index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        // Serves latest-conversation resolution and the all-messages listing.
        let user_time_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_time_idx".to_string())
                    .build(),
            )
            .build();

        self.messages()
            .create_index(user_time_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_time index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    // Collection accessors

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn messages(&self) -> Collection<Message> {
        self.db.collection("messages")
    }
}

#[async_trait]
impl UserStore for MongoDb {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users().insert_one(user, None).await.map_err(|e| {
            tracing::error!("Failed to insert user: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.users()
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find user by id: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    async fn find_by_username_lower(
        &self,
        username_lower: &str,
    ) -> Result<Option<User>, AppError> {
        self.users()
            .find_one(doc! { "username_lower": username_lower }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find user by username: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let cursor = self.users().find(doc! {}, None).await.map_err(|e| {
            tracing::error!("Failed to query users: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect users: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MongoDb {
    async fn insert_message(&self, message: &Message) -> Result<(), AppError> {
        self.messages()
            .insert_one(message, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert message: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn recent_history(
        &self,
        user_id: &str,
        conversation_id: &str,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let filter = doc! {
            "user_id": user_id,
            "conversation_id": conversation_id,
            "timestamp": { "$lt": before.timestamp_millis() }
        };
        // The store fetches newest-first so the limit lands on the most
        // recent turns; callers get them back oldest-first.
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .build();

        let cursor = self.messages().find(filter, options).await.map_err(|e| {
            tracing::error!("Failed to query recent history: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        let mut messages: Vec<Message> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect recent history: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        messages.reverse();
        Ok(messages)
    }

    async fn latest_conversation_id(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let options = FindOneOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .build();

        let latest = self
            .messages()
            .find_one(doc! { "user_id": user_id }, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to resolve latest conversation: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(latest.map(|m| m.conversation_id))
    }

    async fn messages_for_user(&self, user_id: &str) -> Result<Vec<Message>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": 1 })
            .build();

        let cursor = self
            .messages()
            .find(doc! { "user_id": user_id }, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query user messages: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect user messages: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    async fn messages_for_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": 1 })
            .build();

        let cursor = self
            .messages()
            .find(
                doc! { "user_id": user_id, "conversation_id": conversation_id },
                options,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to query conversation messages: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect conversation messages: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }
}
