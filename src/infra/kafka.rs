//! Kafka-backed notification publisher.
//!
//! Notifications are a best-effort side channel: every fallible step is an
//! internal `try_*` call whose error is logged here and swallowed, so the
//! enclosing use case never fails because of the broker. A broker that cannot
//! even be reached at startup degrades the publisher to a warning-only no-op.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use tracing::{debug, error, info, warn};

use crate::app::ports::NotificationPublisher;
use crate::config::KafkaConfig;
use crate::error::PublishError;

/// Bounded wait for broker acknowledgment of a published message.
const ACK_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaNotifier {
    producer: Option<FutureProducer>,
    admin: Option<AdminClient<DefaultClientContext>>,
}

impl KafkaNotifier {
    pub fn new(config: &KafkaConfig) -> Self {
        let mut client_config = ClientConfig::new();
        client_config.set("bootstrap.servers", &config.bootstrap_servers);
        if let (Some(username), Some(password)) =
            (&config.sasl_username, &config.sasl_password)
        {
            client_config
                .set("security.protocol", "sasl_plaintext")
                .set("sasl.mechanism", "PLAIN")
                .set("sasl.username", username)
                .set("sasl.password", password);
        }

        // Bound delivery waits so a slow broker cannot hold a request
        // handler much longer than the acknowledgment window.
        let mut producer_config = client_config.clone();
        producer_config.set("message.timeout.ms", "10000");

        let producer = match producer_config.create::<FutureProducer>() {
            Ok(producer) => Some(producer),
            Err(e) => {
                warn!(error = %e, "Error initializing Kafka producer; notifications disabled");
                None
            }
        };
        let admin = match client_config.create::<AdminClient<DefaultClientContext>>() {
            Ok(admin) => Some(admin),
            Err(e) => {
                warn!(error = %e, "Error initializing Kafka admin client; topic creation disabled");
                None
            }
        };

        Self { producer, admin }
    }

    async fn try_ensure_topic(&self, topic: &str) -> Result<(), PublishError> {
        let admin = self.admin.as_ref().ok_or(PublishError::Unavailable)?;

        let new_topic = NewTopic::new(topic, 1, TopicReplication::Fixed(1));
        let results = admin
            .create_topics([&new_topic], &AdminOptions::new())
            .await?;
        for result in results {
            match result {
                Ok(name) => info!(topic = %name, "Topic created"),
                // Existing topic is success, not an error
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!(topic = %name, "Topic already exists");
                }
                Err((name, code)) => {
                    return Err(PublishError::TopicCreation { topic: name, code });
                }
            }
        }
        Ok(())
    }

    async fn try_publish(&self, topic: &str, message: &str) -> Result<(), PublishError> {
        let producer = self.producer.as_ref().ok_or(PublishError::Unavailable)?;

        let record = FutureRecord::<(), str>::to(topic).payload(message);
        producer
            .send(record, Timeout::After(ACK_TIMEOUT))
            .await
            .map_err(|(e, _message)| PublishError::Kafka(e))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationPublisher for KafkaNotifier {
    async fn ensure_topic(&self, topic: &str) {
        if let Err(e) = self.try_ensure_topic(topic).await {
            error!(topic = %topic, error = %e, "Error creating topic");
        }
    }

    async fn publish(&self, topic: &str, message: &str) {
        if let Err(e) = self.try_publish(topic, message).await {
            error!(topic = %topic, error = %e, "Error sending message");
        }
    }
}
