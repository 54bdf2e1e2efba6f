//! Input validation utilities

use crate::models::{ListingFields, ListingForm, NewUser, RegisterRequest};

const MIN_PASSWORD_LEN: usize = 6;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if !email.contains('@') {
        return Err("Please enter a valid email address".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }

    Ok(())
}

/// Trim and validate a registration request
pub fn validate_registration(request: RegisterRequest) -> Result<NewUser, String> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&request.password)?;

    Ok(NewUser {
        username,
        email,
        password: request.password,
    })
}

/// Parse a listing price; must be a finite, non-negative number
pub fn parse_price(raw: &str) -> Result<f64, String> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("Invalid price: {:?}", raw))?;

    if !price.is_finite() {
        return Err(format!("Invalid price: {:?}", raw));
    }

    if price < 0.0 {
        return Err("Price cannot be negative".to_string());
    }

    Ok(price)
}

/// Parse an HTML-form style boolean
pub fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "off" | "no" => Ok(false),
        "true" | "1" | "on" | "yes" => Ok(true),
        _ => Err(format!("Invalid boolean value: {:?}", raw)),
    }
}

/// Parse a rental duration in hours
pub fn parse_rental_duration(raw: &str) -> Result<Option<i64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<i64>() {
        Ok(hours) if hours >= 0 => Ok(Some(hours)),
        _ => Err(format!("Invalid rental duration: {:?}", raw)),
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("Missing required field: {}", name)),
    }
}

/// Validate the text fields of a listing form
pub fn validate_listing(form: &ListingForm) -> Result<ListingFields, String> {
    let title = required(&form.title, "title")?;
    let description = required(&form.description, "description")?;
    let price = parse_price(required(&form.price, "price")?)?;

    let is_rental = match &form.is_rental {
        Some(raw) => parse_flag(raw)?,
        None => false,
    };

    let rental_duration = match &form.rental_duration {
        Some(raw) => parse_rental_duration(raw)?,
        None => None,
    };

    let category = form
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(ListingFields {
        title: title.to_string(),
        description: description.to_string(),
        price,
        is_rental,
        rental_duration: if is_rental { rental_duration } else { None },
        category,
    })
}
