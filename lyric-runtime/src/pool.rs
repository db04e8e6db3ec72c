//! # Pool 模块
//!
//! 对象池：持有所有存活的视觉对象，按插入顺序更新、回收和绘制。
//!
//! 每帧顺序：
//!
//! ```text
//! 追加新对象 → 按插入顺序 update（期间生成的子对象追加到末尾并在本帧更新）
//!           → 一次稳定回收死亡对象 → 按插入顺序产出绘制描述
//! ```

use tracing::trace;

use crate::render::RenderCommand;
use crate::visual::{UpdateContext, Visual};

/// 视觉对象池
#[derive(Debug, Default)]
pub struct ObjectPool {
    objects: Vec<Box<dyn Visual>>,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加对象（在下一次 `tick` 中更新）
    pub fn spawn(&mut self, visual: Box<dyn Visual>) {
        self.objects.push(visual);
    }

    /// 推进一帧，返回存活对象的绘制描述
    pub fn tick(&mut self, ctx: &mut UpdateContext<'_>) -> Vec<RenderCommand> {
        let mut index = 0;
        while index < self.objects.len() {
            self.objects[index].update(ctx);
            self.objects.extend(ctx.take_spawned());
            index += 1;
        }

        let before = self.objects.len();
        self.objects.retain(|obj| !obj.is_dead());
        let reaped = before - self.objects.len();
        if reaped > 0 {
            trace!(reaped, live = self.objects.len(), "回收死亡对象");
        }

        self.objects.iter().filter_map(|obj| obj.render()).collect()
    }

    /// 清空所有对象
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Visual> {
        self.objects.iter().map(|obj| obj.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{LifeTiming, Lifecycle};
    use crate::render::{LocalTransform, Paint, Shape, Vec2, Viewport};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// 固定寿命的测试对象；`children` 个子对象在首次更新时生成
    #[derive(Debug)]
    struct Probe {
        tag: u32,
        life: Lifecycle,
        children: u32,
    }

    impl Probe {
        fn boxed(tag: u32, lifetime: f64) -> Box<dyn Visual> {
            Box::new(Self {
                tag,
                life: Lifecycle::new(LifeTiming::new(lifetime, 0.0, lifetime), 0.0),
                children: 0,
            })
        }
    }

    impl Visual for Probe {
        fn lifecycle(&self) -> &Lifecycle {
            &self.life
        }

        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            self.life.update(ctx.now_ms);
            for i in 0..std::mem::take(&mut self.children) {
                ctx.spawn(Probe::boxed(self.tag * 10 + i + 1, 1000.0));
            }
        }

        fn render(&self) -> Option<RenderCommand> {
            Some(RenderCommand {
                anchor: Vec2::new(self.tag as f32, self.life.elapsed() as f32),
                shape: Shape::Glyph {
                    text: String::new(),
                    size: 0.0,
                },
                enabled: self.life.is_enabled(),
                fade_in: self.life.fade_in(),
                fade_out: self.life.fade_out(),
                pre_active_offset: None,
                paint: Paint {
                    fill: None,
                    stroke: None,
                    stroke_weight: 0.0,
                    alpha: 255.0,
                },
                transform: LocalTransform::default(),
            })
        }
    }

    fn tick(pool: &mut ObjectPool, now_ms: f64) -> Vec<u32> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = UpdateContext::new(now_ms, Viewport::new(100.0, 100.0), &mut rng);
        pool.tick(&mut ctx)
            .into_iter()
            .map(|cmd| cmd.anchor.x as u32)
            .collect()
    }

    #[test]
    fn test_reap_preserves_order() {
        let mut pool = ObjectPool::new();
        pool.spawn(Probe::boxed(1, 1000.0));
        pool.spawn(Probe::boxed(2, 10.0));
        pool.spawn(Probe::boxed(3, 1000.0));

        // 第二个对象本帧到期
        assert_eq!(tick(&mut pool, 10.0), vec![1, 3]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_children_are_updated_in_same_tick() {
        let mut pool = ObjectPool::new();
        pool.spawn(Box::new(Probe {
            tag: 1,
            life: Lifecycle::new(LifeTiming::new(1000.0, 0.0, 1000.0), 0.0),
            children: 2,
        }));
        pool.spawn(Probe::boxed(5, 1000.0));

        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = UpdateContext::new(40.0, Viewport::new(100.0, 100.0), &mut rng);
        let commands = pool.tick(&mut ctx);

        let tags: Vec<u32> = commands.iter().map(|c| c.anchor.x as u32).collect();
        assert_eq!(tags, vec![1, 5, 11, 12]);
        // 子对象已经被更新过
        assert!(commands.iter().all(|c| c.anchor.y == 40.0));
    }

    #[test]
    fn test_clear() {
        let mut pool = ObjectPool::new();
        pool.spawn(Probe::boxed(1, 1000.0));
        pool.clear();
        assert!(pool.is_empty());
        assert!(tick(&mut pool, 0.0).is_empty());
    }

    #[test]
    fn test_everything_dies_eventually() {
        let mut pool = ObjectPool::new();
        for tag in 0..5 {
            pool.spawn(Probe::boxed(tag, 100.0 * (tag + 1) as f64));
        }
        assert_eq!(tick(&mut pool, 250.0), vec![2, 3, 4]);
        assert_eq!(pool.iter().count(), 3);
        assert!(tick(&mut pool, 500.0).is_empty());
    }
}
