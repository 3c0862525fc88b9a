pub mod http_mail_service;
