// Depth camera → point frames.
// Opens a camera that streams depth as a grayscale image (brighter = closer to
// the camera) and keeps the pixels that sit in a thin band just above the
// projection surface. Visual expectation: a hand resting on the table becomes
// a few dozen points; an empty table becomes an empty frame.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Error;
use crate::types::{Frame, Point};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::LumaFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

// We also use `image` crate types to walk the decoded depth image.
use image::{GrayImage, Luma};

/// What the point source is asked to deliver, and to whom.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Subscription {
    /// Name of the reference surface the points are measured against.
    pub relative_to: String,
    /// Meters above the surface where points start being accepted.
    pub surface_z_offset: f64,
    /// Thickness of the accepting band above the offset, in meters.
    pub height: f64,
    /// Most points delivered per frame (lowest points win).
    pub point_limit: usize,
    /// Deliver frames with no points too. Needed for the dwell reset to see a lifted hand.
    pub send_empty_frames: bool,
    /// Name of the per-frame entry point, used to tag log lines.
    pub callback_name: String,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            relative_to: "surface".into(),
            surface_z_offset: 0.042,
            height: 0.045,
            point_limit: 50,
            send_empty_frames: true,
            callback_name: "run".into(),
        }
    }
}

impl Subscription {
    /// Reject options no frame could ever satisfy, before any frame is delivered.
    pub fn validate(&self) -> Result<(), Error> {
        if self.relative_to.trim().is_empty() {
            return Err(Error::Config("subscription.relative_to is empty".into()));
        }
        if !self.surface_z_offset.is_finite() || self.surface_z_offset < 0.0 {
            return Err(Error::Config(format!(
                "subscription.surface_z_offset must be >= 0, got {}",
                self.surface_z_offset
            )));
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(Error::Config(format!(
                "subscription.height must be > 0, got {}",
                self.height
            )));
        }
        if self.point_limit == 0 {
            return Err(Error::Config("subscription.point_limit must be > 0".into()));
        }
        if self.callback_name.trim().is_empty() {
            return Err(Error::Config("subscription.callback_name is empty".into()));
        }
        Ok(())
    }

    /// Apply the delivery policy: cap the point count, drop empty frames unless asked for.
    pub fn deliver(&self, mut frame: Frame) -> Option<Frame> {
        frame.truncate(self.point_limit);
        if frame.is_empty() && !self.send_empty_frames {
            return None;
        }
        Some(frame)
    }

    /// Is a height above the surface inside the accepting band?
    pub fn accepts(&self, height_above_surface: f64) -> bool {
        height_above_surface >= self.surface_z_offset
            && height_above_surface <= self.surface_z_offset + self.height
    }
}

/// How gray levels turn into distances.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepthScale {
    /// Distance from the camera to the reference surface, in meters.
    pub surface_distance_m: f64,
    /// Distance represented by gray level 0; 255 is the camera itself.
    pub max_range_m: f64,
    /// Only every `stride`-th pixel in each direction is examined.
    pub stride: usize,
}

impl Default for DepthScale {
    fn default() -> Self {
        Self { surface_distance_m: 1.2, max_range_m: 2.0, stride: 4 }
    }
}

impl DepthScale {
    /// Gray level → height above the surface, in meters (negative = below it).
    pub fn height_above_surface(&self, gray: u8) -> f64 {
        let distance = (1.0 - gray as f64 / 255.0) * self.max_range_m;
        self.surface_distance_m - distance
    }
}

/// Turn one depth image into surface points.
/// x is mirrored into [-1, 0] to match the projector; y runs 0..1 top to bottom;
/// z is the height above the surface. Lowest points first, capped at `point_limit`.
pub fn depth_band_points(depth: &GrayImage, scale: &DepthScale, sub: &Subscription) -> Frame {
    let (w, h) = depth.dimensions();
    let stride = scale.stride.max(1);

    let mut points: Vec<Point> = Vec::new();
    for y in (0..h).step_by(stride) {
        for x in (0..w).step_by(stride) {
            let Luma([gray]) = *depth.get_pixel(x, y);
            let z = scale.height_above_surface(gray);
            if sub.accepts(z) {
                points.push(Point::xyz(-(x as f64) / w as f64, y as f64 / h as f64, z));
            }
        }
    }

    points.sort_by(|a, b| a.z.unwrap_or(0.0).total_cmp(&b.z.unwrap_or(0.0)));
    points.truncate(sub.point_limit);
    points
}

// A small wrapper around nokhwa::Camera so our main loop stays clean.
pub struct DepthCamera {
    cam: Camera,
    subscription: Subscription,
    scale: DepthScale,
}

impl DepthCamera {
    /// Open camera `index` and start streaming. Bad subscription options fail here,
    /// before a single frame is handed to the reducer.
    pub fn new(index: u32, subscription: Subscription, scale: DepthScale) -> Result<Self, Error> {
        subscription.validate()?;

        // 1) Choose the device.
        let idx = CameraIndex::Index(index);

        // 2) Depth cameras commonly expose 640x480 grayscale at 30 FPS.
        let fmt = CameraFormat::new(Resolution::new(640, 480), FrameFormat::GRAY, 30);
        let req = RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(fmt));

        // 3) Create the camera (this might fail if no device exists).
        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        // 4) Start streaming frames from the camera.
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let res = cam.resolution();
        info!(
            index,
            width = res.width(),
            height = res.height(),
            relative_to = %subscription.relative_to,
            callback = %subscription.callback_name,
            "depth camera streaming"
        );
        Ok(Self { cam, subscription, scale })
    }

    /// Grab one depth image and reduce it to points.
    /// None when the frame is empty and empty frames were not requested.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        // 1) Pull a frame from the camera (this blocks until a new frame is ready).
        let raw = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        // 2) Decode to 8-bit grayscale. Rebuilt from raw bytes so we don't depend on
        //    nokhwa and us agreeing on the `image` version.
        let decoded = raw
            .decode_image::<LumaFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode depth: {e}")))?;
        let (w, h) = decoded.dimensions();
        let depth = GrayImage::from_raw(w, h, decoded.into_raw())
            .ok_or_else(|| Error::CameraFrame(format!("Depth buffer does not match {w}x{h}")))?;

        let points = depth_band_points(&depth, &self.scale, &self.subscription);
        debug!(callback = %self.subscription.callback_name, points = points.len(), "depth frame");
        Ok(self.subscription.deliver(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_subscription_is_valid() {
        Subscription::default().validate().unwrap();
    }

    #[test]
    fn rejects_impossible_options() {
        let bad = [
            Subscription { point_limit: 0, ..Default::default() },
            Subscription { height: 0.0, ..Default::default() },
            Subscription { surface_z_offset: -0.01, ..Default::default() },
            Subscription { surface_z_offset: f64::NAN, ..Default::default() },
            Subscription { relative_to: " ".into(), ..Default::default() },
            Subscription { callback_name: String::new(), ..Default::default() },
        ];
        for sub in bad {
            assert!(matches!(sub.validate(), Err(Error::Config(_))), "{sub:?}");
        }
    }

    #[test]
    fn delivery_caps_points_and_honors_empty_policy() {
        let sub = Subscription { point_limit: 3, ..Default::default() };
        let frame = vec![Point::xy(0.0, 0.0); 10];
        assert_eq!(sub.deliver(frame).map(|f| f.len()), Some(3));
        assert_eq!(sub.deliver(Vec::new()), Some(Vec::new()));

        let quiet = Subscription { send_empty_frames: false, ..Default::default() };
        assert_eq!(quiet.deliver(Vec::new()), None);
    }

    #[test]
    fn band_keeps_only_points_just_above_surface() {
        // Surface at 1.0 m, gray 0 = 2.0 m away, so height = 2g/255 - 1.
        let scale = DepthScale { surface_distance_m: 1.0, max_range_m: 2.0, stride: 1 };
        let sub = Subscription { surface_z_offset: 0.02, height: 0.05, point_limit: 100, ..Default::default() };

        // 131 -> ~0.027 m (inside), 128 -> ~0.004 m (too low), 200 -> ~0.57 m (too high)
        let mut img = GrayImage::from_pixel(4, 2, Luma([128]));
        img.put_pixel(0, 0, Luma([131]));
        img.put_pixel(3, 1, Luma([131]));
        img.put_pixel(2, 0, Luma([200]));

        let pts = depth_band_points(&img, &scale, &sub);
        assert_eq!(pts.len(), 2);
        assert_eq!((pts[0].x, pts[0].y), (0.0, 0.0));
        assert_eq!((pts[1].x, pts[1].y), (-0.75, 0.5));
        assert!(pts.iter().all(|p| sub.accepts(p.z.unwrap())));
    }

    #[test]
    fn band_prefers_lowest_points_when_over_the_limit() {
        let scale = DepthScale { surface_distance_m: 1.0, max_range_m: 2.0, stride: 1 };
        let sub = Subscription { surface_z_offset: 0.0, height: 0.1, point_limit: 1, ..Default::default() };
        let mut img = GrayImage::from_pixel(2, 1, Luma([0]));
        img.put_pixel(0, 0, Luma([133])); // ~0.043 m
        img.put_pixel(1, 0, Luma([129])); // ~0.012 m
        let pts = depth_band_points(&img, &scale, &sub);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].x, -0.5);
    }
}
