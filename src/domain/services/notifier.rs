use crate::domain::ports::MailService;
use std::sync::Arc;
use tera::Tera;
use tracing::warn;

/// All user-facing mail goes through here. A failed dispatch is logged and
/// swallowed: the state change that triggered it has already committed, and
/// resending a notification is cheap while re-running the mutation is not.
pub struct Notifier {
    mail: Arc<dyn MailService>,
    templates: Arc<Tera>,
}

impl Notifier {
    pub fn new(mail: Arc<dyn MailService>, templates: Arc<Tera>) -> Self {
        Self { mail, templates }
    }

    pub async fn verification_code(&self, email: &str, code: &str) {
        let mut ctx = tera::Context::new();
        ctx.insert("code", code);
        let body = match self.templates.render("verification_code.html", &ctx) {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to render verification mail: {:?}", e);
                format!("Ваш код: {}", code)
            }
        };
        self.dispatch(email, "Код подтверждения", &body).await;
    }

    pub async fn welcome(&self, email: &str, full_name: &str) {
        self.dispatch(email, "Регистрация подтверждена", &format!("Добро пожаловать, {}", full_name)).await;
    }

    pub async fn reset_link(&self, email: &str, token: &str) {
        let mut ctx = tera::Context::new();
        ctx.insert("token", token);
        let body = match self.templates.render("password_reset.html", &ctx) {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to render reset mail: {:?}", e);
                format!("Перейдите по ссылке /auth/reset?token={} для смены пароля", token)
            }
        };
        self.dispatch(email, "Сброс пароля", &body).await;
    }

    pub async fn password_changed(&self, email: &str) {
        self.dispatch(email, "Пароль обновлен", "Пароль был успешно изменен").await;
    }

    pub async fn password_reset_by_admin(&self, email: &str) {
        self.dispatch(email, "Сброс пароля", "Пароль был сброшен администратором").await;
    }

    pub async fn event_invitation(&self, email: &str, title: &str) {
        self.dispatch(email, "Новое событие", &format!("Вас пригласили на {}", title)).await;
    }

    pub async fn participation_confirmed(&self, email: &str, title: &str) {
        self.dispatch(email, "Новый участник", &format!("Пользователь подтвердил участие в {}", title)).await;
    }

    pub async fn participation_cancelled(&self, email: &str, title: &str) {
        self.dispatch(email, "Отмена участия", &format!("Пользователь отменил участие в {}", title)).await;
    }

    pub async fn event_updated(&self, email: &str, title: &str) {
        self.dispatch(email, "Событие обновлено", &format!("Изменены данные события {}", title)).await;
    }

    async fn dispatch(&self, recipient: &str, subject: &str, body: &str) {
        if let Err(e) = self.mail.send(recipient, subject, body).await {
            warn!("Mail dispatch failed for {} ({}): {:?}", recipient, subject, e);
        }
    }
}
