//! gridhaven — isometric villager sim running headless over the engine
//! crates: scene graph, grid collision, A* navigation, FOV, and an optional
//! relay connection for multiplayer presence.

mod ai;
mod components;
mod config;
mod map;
mod projectile;
mod services;
mod state;

use anyhow::Result;
use rand::Rng;

use engine_core::{
    AiBehavior, Appearance, Component, DrawItem, DrawQueue, Node, NodeId, ProjectileSet, Scene,
    Vec2, Vec3, WorldClock,
};
use nav::Pathfinder;
use net::RelayClient;
use spatial::{visibility_polygon, CollisionWorld, FovConfig};

use config::GameConfig;
use map::{populate, BlockRecord, MapDoc};
use services::{NoiseBus, Services};
use state::GameState;

/// Keeps the demo world lively: rings the plaza bell now and then, and
/// occasionally fires a shot so villagers have something to flee.
struct DemoDirector {
    bell_timer: f32,
    shot_timer: f32,
}

impl DemoDirector {
    fn new() -> Self {
        Self {
            bell_timer: 6.0,
            shot_timer: 18.0,
        }
    }

    fn update(
        &mut self,
        scene: &mut Scene,
        player: NodeId,
        noise: &mut NoiseBus,
        dt: f32,
    ) {
        let mut rng = rand::thread_rng();

        self.bell_timer -= dt;
        if self.bell_timer <= 0.0 {
            self.bell_timer = 6.0 + rng.gen::<f32>() * 6.0;
            let spot = Vec2::new(
                4.0 + rng.gen::<f32>() * 16.0,
                4.0 + rng.gen::<f32>() * 16.0,
            );
            noise.publish(spot, 9.0, "bell");
            log::debug!("bell at {spot}");
        }

        self.shot_timer -= dt;
        if self.shot_timer <= 0.0 {
            self.shot_timer = 15.0 + rng.gen::<f32>() * 10.0;
            let angle = rng.gen::<f32>() * std::f32::consts::TAU;
            let dir = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let origin = scene.global_position(player);
            if let Some(Component::Projectiles(set)) = scene
                .get_component_mut(player, engine_core::ComponentKind::Projectiles)
            {
                set.fire(origin + dir, dir * 12.0, 3.0);
                log::debug!("shot fired from {origin}");
            }
        }
    }
}

/// Headless draw sink: collects the frame's submissions for the status log.
#[derive(Default)]
struct DrawLog {
    items: Vec<DrawItem>,
}

impl DrawQueue for DrawLog {
    fn submit(&mut self, item: DrawItem) {
        self.items.push(item);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let config = GameConfig::load();
    if !std::path::Path::new("config.ron").exists() {
        config.save();
    }

    let mut world = CollisionWorld::new();
    let mut state = GameState::new();
    let summary = match MapDoc::load(&config.map_path) {
        Ok(doc) => populate(&doc, &mut world),
        Err(e) => {
            log::warn!(
                "no usable map at {} ({e}); using the built-in arena",
                config.map_path
            );
            populate(&default_arena(), &mut world)
        }
    };
    state.work_zones = summary.work_zones;

    let nav = Pathfinder::new();
    let mut clock = WorldClock::new();
    clock.set_fixed_rate(config.tick_hz);
    clock.set_time_scale(config.time_scale);
    let mut noise = NoiseBus::new();

    let mut scene = Scene::new();
    let player = spawn_player(&mut scene);
    spawn_villagers(&mut scene, &world, config.villagers);

    let mut client = config
        .enable_net
        .then(|| RelayClient::connect(config.relay_addr.clone()));
    if client.is_some() {
        log::info!("relay session at {}", config.relay_addr);
    }

    let mut director = DemoDirector::new();
    let mut status_timer = 0.0f32;
    let mut presence_timer = 0.0f32;
    log::info!(
        "gridhaven up: {} villagers, {} colliders, {} work zones",
        config.villagers,
        summary.colliders,
        state.work_zones.len()
    );

    while state.running {
        clock.update();
        while clock.should_fixed_update() {
            let dt = clock.fixed_timestep_seconds() * clock.time_scale();
            noise.update(dt);
            director.update(&mut scene, player, &mut noise, dt);
            let mut services = Services {
                collision: &world,
                nav: &nav,
                clock: &clock,
                noise: &mut noise,
                renderer: None,
            };
            components::update_components(&mut scene, dt, &mut services, &mut state);
        }

        // Network: drain inbound without blocking, push presence at 4 Hz.
        if let Some(client) = client.as_mut() {
            for message in client.poll() {
                state.apply_net_message(&message);
            }
            presence_timer += clock.delta_seconds();
            if presence_timer >= 0.25 {
                presence_timer = 0.0;
                if let Some(id) = client.session_id() {
                    let pos = scene.global_position(player);
                    if let Err(e) = client.send(serde_json::json!({
                        "type": "presence",
                        "id": id,
                        "x": pos.x,
                        "y": pos.y,
                        "name": "player",
                    })) {
                        log::debug!("presence not sent: {e}");
                    }
                }
            }
        }

        status_timer += clock.delta_seconds();
        if status_timer >= 5.0 {
            status_timer = 0.0;
            let fan = visibility_polygon(
                &world,
                scene.global_position(player),
                Some(Vec2::X),
                &FovConfig::default(),
            );
            let mut draws = DrawLog::default();
            scene.visit_draw(scene.root(), &mut draws);
            draws.items.sort_by_key(|item| item.draw_order);
            log::info!(
                "day {:.2} ({}) | {} nodes, {} drawn | {} peers | player fan {} pts",
                clock.time_of_day(),
                if clock.is_night() { "night" } else { "day" },
                scene.len(),
                draws.items.len(),
                state.peers.len(),
                fan.len()
            );
        }

        std::thread::sleep(std::time::Duration::from_millis(4));
    }

    Ok(())
}

/// The player node: a projectile manager and a fixed look.
fn spawn_player(scene: &mut Scene) -> NodeId {
    let player = scene.spawn_child(
        scene.root(),
        Node::new("player")
            .with_tag("player")
            .with_position(Vec3::new(12.0, 12.0, 0.0))
            .with_draw_order(10),
    );
    scene.add_component(player, Component::Appearance(Appearance::new([90, 140, 220], [240, 240, 240])));
    scene.add_component(player, Component::Projectiles(ProjectileSet::new()));
    player
}

/// Scatter villagers on free cells around the arena center.
fn spawn_villagers(scene: &mut Scene, world: &CollisionWorld, count: usize) {
    let mut rng = rand::thread_rng();
    let palette: [[u8; 3]; 5] = [
        [200, 120, 80],
        [120, 180, 90],
        [90, 140, 200],
        [220, 200, 110],
        [170, 110, 190],
    ];
    for i in 0..count {
        // A few placement attempts per villager; crowded maps just skip.
        let Some(pos) = (0..8)
            .map(|_| {
                Vec3::new(
                    3.0 + rng.gen::<f32>() * 18.0,
                    3.0 + rng.gen::<f32>() * 18.0,
                    0.0,
                )
            })
            .find(|p| !world.check_collision(*p, spatial::DEFAULT_HALF_EXTENT))
        else {
            log::warn!("no free cell for villager {i}");
            continue;
        };
        let villager = scene.spawn_child(
            scene.root(),
            Node::new(format!("villager-{i}"))
                .with_tag("villager")
                .with_position(pos)
                .with_draw_order(5),
        );
        let mut behavior = AiBehavior::new(1.4 + rng.gen::<f32>() * 0.6, 5.0);
        behavior.state_timer = rng.gen::<f32>() * 3.0; // stagger first wanders
        scene.add_component(villager, Component::Ai(behavior));
        scene.add_component(
            villager,
            Component::Appearance(Appearance::new(palette[i % palette.len()], [30, 30, 35])),
        );
    }
}

/// Fallback world when no map document is present: a walled yard with a
/// work bench in one corner.
fn default_arena() -> MapDoc {
    let mut blocks = Vec::new();
    let mut wall = |x: f32, y: f32| {
        blocks.push(BlockRecord {
            name: "wall".to_string(),
            position: [x, y, 0.0],
            size: 4.0,
            color: [110, 110, 120, 255],
            zone: "perimeter".to_string(),
            interaction: String::new(),
            tile: 1,
        });
    };
    for i in 0..24 {
        wall(i as f32, 0.0);
        wall(i as f32, 23.0);
        wall(0.0, i as f32);
        wall(23.0, i as f32);
    }
    blocks.push(BlockRecord {
        name: "bench".to_string(),
        position: [4.0, 4.0, 0.0],
        size: 1.0,
        color: [160, 110, 60, 255],
        zone: "yard".to_string(),
        interaction: "work".to_string(),
        tile: 5,
    });
    MapDoc {
        width: 24,
        height: 24,
        blocks,
    }
}
