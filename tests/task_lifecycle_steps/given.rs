//! Given steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, midday, rating_hundredths, run_async};
use fleetline::task::{
    domain::{Actor, Amount, CompanyId, Rating, UserId},
    services::CreateTaskRequest,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a company with drivers "{first}" and "{second}""#)]
fn company_with_drivers(world: &mut LifecycleWorld, first: String, second: String) {
    for name in [first, second] {
        world
            .drivers
            .insert(name, Actor::driver(UserId::new(), world.company));
    }
}

#[given(r#"a driver "{name}" from another company"#)]
fn foreign_driver(world: &mut LifecycleWorld, name: String) {
    world
        .drivers
        .insert(name, Actor::driver(UserId::new(), CompanyId::new()));
}

#[given(r#"driver "{name}" is rated "{rating}""#)]
fn driver_is_rated(
    world: &mut LifecycleWorld,
    name: String,
    rating: String,
) -> Result<(), eyre::Report> {
    let driver = world.driver(&name)?;
    let rating = Rating::from_hundredths(rating_hundredths(&rating)?)?;
    world.ratings.set_rating(driver.id(), rating)?;
    Ok(())
}

fn post_task(
    world: &mut LifecycleWorld,
    scheduled_for: &str,
    offered_to: Option<UserId>,
) -> Result<(), eyre::Report> {
    let scheduled_date = midday(scheduled_for)?;
    let mut request = CreateTaskRequest::new(
        world.company,
        "Deliver office supplies",
        Amount::from_minor_units(4_200),
        scheduled_date,
    );
    if let Some(driver) = offered_to {
        request = request.offered_to(driver);
    }

    let service = world.service_at(midday("2025-02-20")?);
    let created = run_async(service.create(&world.admin, request))
        .wrap_err("create task for lifecycle scenario")?;
    world.task = Some(created);
    Ok(())
}

#[given(r#"a marketplace task scheduled for "{date}""#)]
fn marketplace_task(world: &mut LifecycleWorld, date: String) -> Result<(), eyre::Report> {
    post_task(world, &date, None)
}

#[given(r#"a task scheduled for "{date}" offered to "{name}""#)]
fn offered_task(world: &mut LifecycleWorld, date: String, name: String) -> Result<(), eyre::Report> {
    let driver = world.driver(&name)?;
    post_task(world, &date, Some(driver.id()))
}
