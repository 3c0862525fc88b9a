use crate::domain::models::{
    event::{Event, EventDraft, EventDto, EventStatus},
    participant::ParticipationStatus,
    rating::{EventRating, RatingView, RatingsResponse},
    user::UserRole,
};
use crate::domain::ports::{
    EventRepository, ParticipantRepository, RatingRepository, UserRepository,
};
use crate::domain::services::export::ParticipantRow;
use crate::domain::services::notifier::Notifier;
use crate::error::AppError;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

const MAX_IMAGE_SIZE_BYTES: usize = 2 * 1024 * 1024;

/// Effective lifecycle state as a pure function of the clock and the event
/// window. REJECTED and PENDING are sticky until explicit moderation; the
/// mid-event window (start < now <= end) keeps whatever was computed before.
pub fn derive_status(
    now: DateTime<Utc>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    current: EventStatus,
) -> EventStatus {
    if current.is_sticky() {
        current
    } else if now > end_at {
        EventStatus::Past
    } else if now <= start_at {
        EventStatus::Active
    } else {
        current
    }
}

pub struct EventService {
    events: Arc<dyn EventRepository>,
    participants: Arc<dyn ParticipantRepository>,
    ratings: Arc<dyn RatingRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<Notifier>,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        participants: Arc<dyn ParticipantRepository>,
        ratings: Arc<dyn RatingRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self { events, participants, ratings, users, notifier }
    }

    /// Applies `derive_status` against the stored row and persists the
    /// correction when it changed. Every read path goes through here, and the
    /// background sweep calls it for the whole table.
    pub async fn reconcile_status(&self, mut event: Event) -> Result<Event, AppError> {
        let derived = derive_status(Utc::now(), event.start_at, event.end_at, event.status);
        if derived != event.status {
            self.events.update_status(&event.id, derived).await?;
            event.status = derived;
        }
        Ok(event)
    }

    pub async fn reconcile_all(&self) -> Result<usize, AppError> {
        let mut changed = 0;
        for event in self.events.list().await? {
            let before = event.status;
            let after = self.reconcile_status(event).await?;
            if after.status != before {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub async fn get_event(&self, id: &str) -> Result<Event, AppError> {
        let event = self
            .events
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Событие не найдено".to_string()))?;
        self.reconcile_status(event).await
    }

    pub async fn list_events(&self, tab: &str, user_id: Option<&str>) -> Result<Vec<EventDto>, AppError> {
        let mut events = Vec::new();
        for event in self.events.list().await? {
            events.push(self.reconcile_status(event).await?);
        }

        let filtered: Vec<Event> = match tab {
            "active" => events.into_iter().filter(|e| e.status == EventStatus::Active).collect(),
            "past" => events.into_iter().filter(|e| e.status == EventStatus::Past).collect(),
            _ => match user_id {
                Some(uid) => {
                    let mine: BTreeSet<String> = self
                        .participants
                        .list_by_user(uid)
                        .await?
                        .into_iter()
                        .filter(|p| p.status == ParticipationStatus::Confirmed)
                        .map(|p| p.event_id)
                        .collect();
                    events
                        .into_iter()
                        .filter(|e| {
                            (mine.contains(&e.id) || e.created_by == uid)
                                && e.status != EventStatus::Rejected
                                && (e.status != EventStatus::Pending || e.created_by == uid)
                        })
                        .collect()
                }
                None => Vec::new(),
            },
        };

        let counts: HashMap<String, i64> = self
            .participants
            .counts_confirmed()
            .await?
            .into_iter()
            .map(|c| (c.event_id, c.count))
            .collect();

        let aggregates: HashMap<String, (f64, i64)> = self
            .ratings
            .aggregates()
            .await?
            .into_iter()
            .map(|a| (a.event_id, (a.average, a.count)))
            .collect();

        let participation: HashMap<String, ParticipationStatus> = match user_id {
            Some(uid) => self
                .participants
                .list_by_user(uid)
                .await?
                .into_iter()
                .map(|p| (p.event_id, p.status))
                .collect(),
            None => HashMap::new(),
        };

        let creator_ids: BTreeSet<String> = filtered.iter().map(|e| e.created_by.clone()).collect();
        let mut creators: HashMap<String, String> = HashMap::new();
        for id in creator_ids {
            if let Some(user) = self.users.find_by_id(&id).await? {
                creators.insert(id, user.full_name);
            }
        }

        let mut dtos: Vec<EventDto> = filtered
            .into_iter()
            .map(|event| {
                let aggregate = aggregates.get(&event.id).copied();
                EventDto {
                    image_url: event.image_url(),
                    participants_count: counts.get(&event.id).copied().unwrap_or(0),
                    created_by_full_name: creators.get(&event.created_by).cloned(),
                    participation_status: participation.get(&event.id).copied(),
                    average_rating: aggregate.map(|(avg, _)| avg),
                    ratings_count: aggregate.map(|(_, count)| count).unwrap_or(0),
                    id: event.id,
                    title: event.title,
                    short_description: event.short_description,
                    full_description: event.full_description,
                    start_at: event.start_at,
                    end_at: event.end_at,
                    payment_info: event.payment_info,
                    max_participants: event.max_participants,
                    status: event.status,
                    created_by: event.created_by,
                }
            })
            .collect();

        dtos.sort_by_key(|d| d.start_at);
        Ok(dtos)
    }

    pub async fn get_event_details(&self, id: &str, user_id: Option<&str>) -> Result<EventDto, AppError> {
        let event = self.get_event(id).await?;

        let participants_count = self.participants.count_confirmed(&event.id).await?;
        let created_by_full_name = self
            .users
            .find_by_id(&event.created_by)
            .await?
            .map(|u| u.full_name);
        let participation_status = match user_id {
            Some(uid) => self
                .participants
                .find_by_event_and_user(&event.id, uid)
                .await?
                .map(|p| p.status),
            None => None,
        };
        let aggregate = self.ratings.aggregate(&event.id).await?;

        Ok(EventDto {
            image_url: event.image_url(),
            participants_count,
            created_by_full_name,
            participation_status,
            average_rating: aggregate.as_ref().map(|a| a.average),
            ratings_count: aggregate.as_ref().map(|a| a.count).unwrap_or(0),
            id: event.id,
            title: event.title,
            short_description: event.short_description,
            full_description: event.full_description,
            start_at: event.start_at,
            end_at: event.end_at,
            payment_info: event.payment_info,
            max_participants: event.max_participants,
            status: event.status,
            created_by: event.created_by,
        })
    }

    pub async fn participation_status(
        &self,
        event_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<ParticipationStatus>, AppError> {
        match user_id {
            Some(uid) => Ok(self
                .participants
                .find_by_event_and_user(event_id, uid)
                .await?
                .map(|p| p.status)),
            None => Ok(None),
        }
    }

    pub async fn confirm_participation(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        let event = self.get_event(event_id).await?;
        if event.status != EventStatus::Active {
            return Err(AppError::Validation("Событие не активно".to_string()));
        }

        self.participants.confirm(&event.id, user_id, event.max_participants).await?;

        info!("User {} confirmed participation in event {}", user_id, event.id);
        if let Some(creator) = self.users.find_by_id(&event.created_by).await? {
            self.notifier.participation_confirmed(&creator.email, &event.title).await;
        }
        Ok(())
    }

    pub async fn cancel_participation(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        let event = self.get_event(event_id).await?;
        let mut participation = self
            .participants
            .find_by_event_and_user(&event.id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Участие не найдено".to_string()))?;

        participation.status = ParticipationStatus::Cancelled;
        participation.cancelled_at = Some(Utc::now());
        self.participants.update(&participation).await?;

        info!("User {} cancelled participation in event {}", user_id, event.id);
        if let Some(creator) = self.users.find_by_id(&event.created_by).await? {
            self.notifier.participation_cancelled(&creator.email, &event.title).await;
        }
        Ok(())
    }

    pub async fn create_event(&self, draft: &EventDraft, creator_id: &str) -> Result<Event, AppError> {
        let creator = self
            .users
            .find_by_id(creator_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Создатель не найден".to_string()))?;

        validate_dates(draft.start_at, draft.end_at)?;

        // User submissions wait for moderation; only admins publish directly.
        let status = if creator.role == UserRole::Admin {
            draft.status.unwrap_or(EventStatus::Active)
        } else {
            EventStatus::Pending
        };

        let mut event = Event::new(draft, status, creator.id.clone());
        apply_image(&mut event, draft.image_base64.as_deref(), draft.image_type.as_deref(), true)?;
        let event = self.events.create(&event).await?;

        let mut invitees: BTreeSet<String> = draft.participant_ids.iter().cloned().collect();
        invitees.insert(creator.id.clone());
        for user_id in invitees {
            let Some(user) = self.users.find_by_id(&user_id).await? else {
                warn!("Skipping unknown invitee {} for event {}", user_id, event.id);
                continue;
            };
            self.participants.confirm(&event.id, &user.id, None).await?;
            self.notifier.event_invitation(&user.email, &event.title).await;
        }

        info!("Event created: {} by {}", event.id, creator.id);
        Ok(event)
    }

    pub async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Event, AppError> {
        let mut event = self.get_event(id).await?;
        validate_dates(draft.start_at, draft.end_at)?;

        event.title = draft.title.clone();
        event.short_description = draft.short_description.clone();
        event.full_description = draft.full_description.clone();
        event.start_at = draft.start_at;
        event.end_at = draft.end_at;
        event.payment_info = draft.payment_info.clone();
        event.max_participants = draft.max_participants;
        if let Some(status) = draft.status {
            event.status = status;
        }
        apply_image(&mut event, draft.image_base64.as_deref(), draft.image_type.as_deref(), false)?;
        event.status = derive_status(Utc::now(), event.start_at, event.end_at, event.status);

        let event = self.events.update(&event).await?;

        info!("Event updated: {}", event.id);
        if let Some(creator) = self.users.find_by_id(&event.created_by).await? {
            self.notifier.event_updated(&creator.email, &event.title).await;
        }
        Ok(event)
    }

    pub async fn approve_event(&self, id: &str) -> Result<(), AppError> {
        let event = self.get_event(id).await?;
        self.events.update_status(&event.id, EventStatus::Active).await?;
        info!("Event approved: {}", event.id);
        Ok(())
    }

    pub async fn reject_event(&self, id: &str) -> Result<(), AppError> {
        let event = self.get_event(id).await?;
        self.events.update_status(&event.id, EventStatus::Rejected).await?;
        info!("Event rejected: {}", event.id);
        Ok(())
    }

    pub async fn add_rating(
        &self,
        event_id: &str,
        user_id: &str,
        score: i32,
        comment: Option<String>,
    ) -> Result<(), AppError> {
        if !(1..=5).contains(&score) {
            return Err(AppError::Validation("Оценка 1-5".to_string()));
        }

        let event = self.get_event(event_id).await?;
        if event.status != EventStatus::Past {
            return Err(AppError::Validation("Оценивать можно только прошедшие события".to_string()));
        }

        let participation = self.participants.find_by_event_and_user(&event.id, user_id).await?;
        if !participation.is_some_and(|p| p.status == ParticipationStatus::Confirmed) {
            return Err(AppError::Validation(
                "Вы не можете оставить отзыв, так как не являетесь подтвержденным участником этого события.".to_string(),
            ));
        }

        if self.ratings.find_by_event_and_user(&event.id, user_id).await?.is_some() {
            return Err(AppError::Validation("Вы уже оценили это событие".to_string()));
        }

        let rating = EventRating::new(event.id.clone(), user_id.to_string(), score, comment);
        self.ratings.create(&rating).await?;
        info!("Rating {} added for event {} by {}", score, event.id, user_id);
        Ok(())
    }

    pub async fn get_ratings(&self, event_id: &str) -> Result<RatingsResponse, AppError> {
        let event = self.get_event(event_id).await?;
        let mut ratings = self.ratings.list_by_event(&event.id).await?;
        if ratings.is_empty() {
            return Ok(RatingsResponse { average: None, count: 0, ratings: Vec::new() });
        }

        let average = ratings.iter().map(|r| r.score as f64).sum::<f64>() / ratings.len() as f64;
        let mut names: HashMap<String, String> = HashMap::new();
        for rating in &ratings {
            if !names.contains_key(&rating.user_id) {
                if let Some(user) = self.users.find_by_id(&rating.user_id).await? {
                    names.insert(rating.user_id.clone(), user.full_name);
                }
            }
        }

        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let count = ratings.len() as i64;
        let views = ratings
            .into_iter()
            .map(|r| RatingView {
                user_name: names.get(&r.user_id).cloned(),
                user_id: r.user_id,
                score: r.score,
                comment: r.comment,
                created_at: r.created_at,
            })
            .collect();

        Ok(RatingsResponse { average: Some(average), count, ratings: views })
    }

    /// Confirmed participants as `fullName;email` lines for the CSV surface.
    pub async fn export_participants(&self, event_id: &str) -> Result<Vec<String>, AppError> {
        let event = self.get_event(event_id).await?;
        let mut lines = Vec::new();
        for participant in self.participants.list_by_event(&event.id).await? {
            if participant.status != ParticipationStatus::Confirmed {
                continue;
            }
            match self.users.find_by_id(&participant.user_id).await? {
                Some(user) => lines.push(format!("{};{}", user.full_name, user.email)),
                None => lines.push(format!("{};", participant.user_id)),
            }
        }
        Ok(lines)
    }

    /// Full roster rows (any status) for the spreadsheet/CSV admin exports.
    pub async fn participant_export_rows(&self, event_id: &str) -> Result<Vec<ParticipantRow>, AppError> {
        let event = self.get_event(event_id).await?;
        let mut rows = Vec::new();
        for participant in self.participants.list_by_event(&event.id).await? {
            let user = self.users.find_by_id(&participant.user_id).await?;
            rows.push(ParticipantRow {
                full_name: user
                    .as_ref()
                    .map(|u| u.full_name.clone())
                    .unwrap_or_else(|| participant.user_id.clone()),
                email: user.map(|u| u.email).unwrap_or_default(),
                status: participant.status.as_str().to_string(),
                confirmed_at: Some(participant.confirmed_at),
                cancelled_at: participant.cancelled_at,
            });
        }
        Ok(rows)
    }
}

fn validate_dates(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<(), AppError> {
    if start_at <= Utc::now() {
        return Err(AppError::Validation("Дата начала должна быть в будущем".to_string()));
    }
    if end_at <= start_at {
        return Err(AppError::Validation("Дата окончания позже даты начала".to_string()));
    }
    Ok(())
}

fn apply_image(
    event: &mut Event,
    image_base64: Option<&str>,
    image_type: Option<&str>,
    required: bool,
) -> Result<(), AppError> {
    let payload = match image_base64 {
        Some(data) if !data.trim().is_empty() => data,
        _ => {
            if required && event.image_data.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::Validation("Требуется изображение".to_string()));
            }
            return Ok(());
        }
    };

    let mime = image_type.unwrap_or("");
    if !mime.starts_with("image/") {
        return Err(AppError::Validation("Поддерживаются только изображения".to_string()));
    }

    let decoded = general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|_| AppError::Validation("Некорректные данные изображения".to_string()))?;

    if decoded.len() > MAX_IMAGE_SIZE_BYTES {
        return Err(AppError::Validation("Размер изображения не должен превышать 2 МБ".to_string()));
    }

    event.image_data = Some(general_purpose::STANDARD.encode(&decoded));
    event.image_content_type = Some(mime.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn upcoming_event_stays_active() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        assert_eq!(
            derive_status(t0() - Duration::hours(1), start, end, EventStatus::Active),
            EventStatus::Active
        );
    }

    #[test]
    fn finished_event_becomes_past() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        assert_eq!(
            derive_status(t0() + Duration::hours(3), start, end, EventStatus::Active),
            EventStatus::Past
        );
    }

    #[test]
    fn rejected_is_sticky_at_any_clock() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        for now in [t0() - Duration::days(1), t0() + Duration::hours(1), t0() + Duration::days(7)] {
            assert_eq!(derive_status(now, start, end, EventStatus::Rejected), EventStatus::Rejected);
        }
    }

    #[test]
    fn pending_is_sticky_at_any_clock() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        for now in [t0() - Duration::days(1), t0() + Duration::days(7)] {
            assert_eq!(derive_status(now, start, end, EventStatus::Pending), EventStatus::Pending);
        }
    }

    #[test]
    fn mid_event_window_keeps_prior_status() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        assert_eq!(
            derive_status(t0() + Duration::hours(1), start, end, EventStatus::Active),
            EventStatus::Active
        );
    }

    #[test]
    fn boundary_at_start_is_active() {
        let start = t0();
        let end = t0() + Duration::hours(2);
        assert_eq!(derive_status(t0(), start, end, EventStatus::Active), EventStatus::Active);
    }

    #[test]
    fn image_is_required_on_create() {
        let draft = EventDraft {
            title: "Т".to_string(),
            short_description: None,
            full_description: "Т".to_string(),
            start_at: t0(),
            end_at: t0() + Duration::hours(1),
            image_base64: None,
            image_type: None,
            payment_info: None,
            max_participants: None,
            participant_ids: Vec::new(),
            status: None,
        };
        let mut event = Event::new(&draft, EventStatus::Pending, "u1".to_string());
        assert!(apply_image(&mut event, None, None, true).is_err());
        assert!(apply_image(&mut event, None, None, false).is_ok());
    }

    #[test]
    fn image_rejects_non_image_mime_and_bad_payload() {
        let draft = EventDraft {
            title: "Т".to_string(),
            short_description: None,
            full_description: "Т".to_string(),
            start_at: t0(),
            end_at: t0() + Duration::hours(1),
            image_base64: None,
            image_type: None,
            payment_info: None,
            max_participants: None,
            participant_ids: Vec::new(),
            status: None,
        };
        let mut event = Event::new(&draft, EventStatus::Pending, "u1".to_string());

        let png = general_purpose::STANDARD.encode(b"fake-png-bytes");
        assert!(apply_image(&mut event, Some(png.as_str()), Some("text/plain"), true).is_err());
        assert!(apply_image(&mut event, Some("%%%not-base64%%%"), Some("image/png"), true).is_err());
        assert!(apply_image(&mut event, Some(png.as_str()), Some("image/png"), true).is_ok());
        assert_eq!(event.image_content_type.as_deref(), Some("image/png"));
    }
}
